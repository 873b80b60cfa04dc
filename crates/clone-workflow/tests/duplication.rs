mod common;

use clone_policy::{CloneSpec, DependentSpec, DuplicationProfile};
use clone_workflow::{DuplicateError, DuplicationEngine, DuplicationState, InvariantError, Stage};
use common::{fixture, Fixture, Options};
use pretty_assertions::assert_eq;
use record_store::{DataService, EntityReference, FaultCode, FaultRule, FieldValue, InMemoryDataService, Operation, Record,
                   RecordId};
use std::sync::Arc;

fn engine(f: &Fixture) -> DuplicationEngine {
  let svc: Arc<dyn DataService> = f.svc.clone();
  DuplicationEngine::new(svc, DuplicationProfile::opportunity()).expect("engine")
}

#[test]
fn full_duplication_copies_root_children_state_and_links() {
  let f = fixture(Options::default());
  let report = engine(&f).run(&f.original).expect("run").expect("report");
  let clone = report.clone.clone();

  assert_ne!(clone.id, f.original.id);
  assert_eq!(clone.logical_name, "opportunity");
  assert_eq!(report.total_dependents(), 3);
  assert!(report.state_transferred);
  assert_eq!(report.total_associations(), 2);
  assert_eq!(report.transitions,
             vec![DuplicationState::Start,
                  DuplicationState::RootCloned,
                  DuplicationState::DependentsCloned,
                  DuplicationState::StateTransferred,
                  DuplicationState::AssociationsReplicated,
                  DuplicationState::Done]);
  assert!(report.finished_at >= report.started_at);

  let stored = f.svc.get("opportunity", clone.id).expect("clone stored");
  assert_eq!(stored.get_str("name"), Some("[Cloned] Big deal"));
  assert_eq!(stored.get("customerid"), Some(&FieldValue::Reference(f.customer.clone())));
  assert_eq!(stored.get("estimatedvalue"), Some(&FieldValue::Money(1500.0)));
}

#[test]
fn root_create_payload_carries_only_allowed_fields() {
  let f = fixture(Options::default());
  engine(&f).duplicate(&f.original).expect("duplicate");

  let creates = f.svc.calls(Operation::Create);
  let root = creates.iter().find(|c| c.logical_name == "opportunity").and_then(|c| c.payload.clone()).expect("root create");
  let names: Vec<&str> = root.fields.keys().map(String::as_str).collect();
  assert_eq!(names, vec!["name", "customerid", "ownerid", "pricelevelid", "estimatedvalue"]);
  assert!(root.id.is_none());
}

#[test]
fn children_are_rebound_to_the_clone_without_computed_fields() {
  let f = fixture(Options::default());
  let clone = engine(&f).duplicate(&f.original).expect("duplicate").expect("clone");

  let originals = f.products_of(f.original.id);
  let clones = f.products_of(clone.id);
  assert_eq!(clones.len(), originals.len());
  for (o, c) in originals.iter().zip(clones.iter()) {
    assert_eq!(c.get("opportunityid"), Some(&FieldValue::Reference(clone.clone())));
    assert_eq!(c.get("productid"), o.get("productid"));
    assert_eq!(c.get("uomid"), o.get("uomid"));
    assert_eq!(c.get("description"), o.get("description"));
    assert_eq!(c.get("statecode"), Some(&FieldValue::OptionSet(1)));
    assert!(!c.contains("entityimage"));
    assert_ne!(c.id, o.id);
  }

  for call in f.svc.calls(Operation::Create).iter().filter(|c| c.logical_name == "opportunityproduct") {
    let sent = call.payload.as_ref().expect("payload");
    for computed in ["baseamount", "extendedamount", "tax", "manualdiscountamount", "opportunityproductid"] {
      assert!(!sent.contains(computed), "{} was sent", computed);
    }
  }
  // el almacén recalcula a partir de cantidad y precio
  assert_eq!(clones[0].get("extendedamount"), Some(&FieldValue::Money(20.0)));
}

#[test]
fn workflow_state_takes_process_and_path_from_original() {
  let f = fixture(Options::default());
  let clone = engine(&f).duplicate(&f.original).expect("duplicate").expect("clone");

  let state = f.state_of(clone.id).expect("clone state");
  assert_eq!(state.get("processid"), Some(&FieldValue::from(f.sales_process)));
  assert_eq!(state.get_str("traversedpath"), Some("stage-a,stage-b"));
  // la etapa activa no es asignable y se queda en la inicial
  assert_eq!(state.get("activestageid"), Some(&FieldValue::from(f.initial_stage)));

  let updates = f.svc.calls(Operation::Update);
  assert_eq!(updates.len(), 1);
  assert_eq!(updates[0].id, state.id);
}

#[test]
fn workflow_step_is_a_no_op_when_original_has_no_state() {
  let f = fixture(Options { original_state: false, ..Options::default() });
  let report = engine(&f).run(&f.original).expect("run").expect("report");

  assert!(!report.state_transferred);
  assert!(f.svc.calls(Operation::Update).is_empty());
  let state = f.state_of(report.clone.id).expect("state created by store");
  assert_eq!(state.get("processid"), Some(&FieldValue::from(f.default_process)));
  assert_eq!(report.transitions.last(), Some(&DuplicationState::Done));
}

#[test]
fn missing_clone_state_is_an_unexpected_error() {
  let f = fixture(Options { bind_process: false, ..Options::default() });
  let err = engine(&f).duplicate(&f.original).unwrap_err();

  assert!(matches!(err, DuplicateError::Unexpected(InvariantError::MissingCloneWorkflowState { .. })));
  assert!(f.svc.calls(Operation::Update).is_empty());
  assert!(f.svc.calls(Operation::Associate).is_empty());
}

#[test]
fn associations_match_original_and_shared_records_are_not_copied() {
  let f = fixture(Options::default());
  let clone = engine(&f).duplicate(&f.original).expect("duplicate").expect("clone");

  let mut expected = f.stakeholders.clone();
  expected.sort();
  assert_eq!(f.links_of(clone.id), expected);
  assert_eq!(f.links_of(f.original.id), expected);
  assert_eq!(f.svc.count("crff8_stakeholder"), 2);
  assert_eq!(f.svc.calls(Operation::Associate).len(), 2);
}

#[test]
fn duplicating_twice_yields_two_independent_clones() {
  let f = fixture(Options::default());
  let e = engine(&f);
  let c1 = e.duplicate(&f.original).expect("first").expect("clone");
  let c2 = e.duplicate(&f.original).expect("second").expect("clone");

  assert_ne!(c1.id, c2.id);
  assert_eq!(f.products_of(c1.id).len(), 3);
  assert_eq!(f.products_of(c2.id).len(), 3);
  assert_eq!(f.links_of(c1.id), f.links_of(c2.id));
  assert_eq!(f.svc.count("opportunity"), 3);
}

#[test]
fn original_is_left_untouched() {
  let f = fixture(Options::default());
  let before = f.svc.get("opportunity", f.original.id).expect("original");
  let products_before = f.products_of(f.original.id);

  engine(&f).duplicate(&f.original).expect("duplicate");

  assert_eq!(f.svc.get("opportunity", f.original.id).expect("original"), before);
  assert_eq!(f.products_of(f.original.id), products_before);
}

#[test]
fn wrong_record_type_does_nothing() {
  let f = fixture(Options::default());
  f.svc.clear_journal();
  let result = engine(&f).duplicate(&EntityReference::new("account", f.customer.id)).expect("no error");

  assert!(result.is_none());
  assert!(f.svc.journal().is_empty());
}

#[test]
fn missing_root_reports_not_found_and_creates_nothing() {
  let f = fixture(Options::default());
  let missing = EntityReference::new("opportunity", RecordId::new_v4());
  let err = engine(&f).duplicate(&missing).unwrap_err();

  match &err {
    DuplicateError::NotFound { reference, fault } => {
      assert_eq!(reference, &missing);
      assert_eq!(fault.code, FaultCode::OBJECT_DOES_NOT_EXIST);
    }
    other => panic!("unexpected error: {other:?}"),
  }
  assert!(f.svc.calls(Operation::Create).is_empty());
}

#[test]
fn other_fetch_faults_are_service_errors() {
  let f = fixture(Options::default());
  f.svc.inject_fault(FaultRule::new(Operation::Fetch, Some("opportunity"), 1));
  let err = engine(&f).duplicate(&f.original).unwrap_err();

  assert_eq!(err.stage(), Some(Stage::FetchRoot));
  assert_eq!(err.fault().map(|x| x.code), Some(FaultCode::UNEXPECTED));
  assert!(f.svc.calls(Operation::Create).is_empty());
}

#[test]
fn fault_on_second_child_stops_the_pipeline() {
  let f = fixture(Options::default());
  f.svc.inject_fault(FaultRule::new(Operation::Create, Some("opportunityproduct"), 2));
  let err = engine(&f).duplicate(&f.original).unwrap_err();

  assert!(matches!(err, DuplicateError::Service { stage: Stage::CloneDependents, .. }));
  assert!(err.to_string().contains("clone-dependents"));

  // raíz y primer hijo quedan creados, el tercero nunca se intentó
  assert_eq!(f.svc.count("opportunity"), 2);
  let clone = f.svc
               .records_of("opportunity")
               .into_iter()
               .find(|r| r.id != Some(f.original.id))
               .and_then(|r| r.id)
               .expect("partial clone");
  assert_eq!(f.products_of(clone).len(), 1);
  assert_eq!(f.svc.calls(Operation::Create).iter().filter(|c| c.logical_name == "opportunityproduct").count(), 2);

  assert!(f.svc.calls(Operation::Update).is_empty());
  assert!(f.svc.calls(Operation::Associate).is_empty());
  assert!(f.links_of(clone).is_empty());
}

#[test]
fn association_fault_keeps_the_provider_fault() {
  let f = fixture(Options::default());
  f.svc.inject_fault(FaultRule::new(Operation::Associate, None, 1).with_code(FaultCode::DUPLICATE_RECORD, "dup"));
  let err = engine(&f).duplicate(&f.original).unwrap_err();

  assert_eq!(err.stage(), Some(Stage::ReplicateAssociations));
  let fault = err.fault().expect("fault");
  assert_eq!(fault.code, FaultCode::DUPLICATE_RECORD);
  assert_eq!(fault.message, "dup");
  assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn empty_collections_still_reach_done() {
  let f = fixture(Options { products: 0, stakeholders: 0, ..Options::default() });
  let report = engine(&f).run(&f.original).expect("run").expect("report");

  assert_eq!(report.dependents_cloned, vec![("opportunityproduct".to_string(), 0)]);
  assert_eq!(report.associations_replicated,
             vec![("crff8_Stakeholder_Opportunity_Opportunity".to_string(), 0)]);
  assert_eq!(report.transitions.last(), Some(&DuplicationState::Done));
}

#[test]
fn engine_runs_any_root_type_described_by_a_profile() {
  let svc = Arc::new(InMemoryDataService::new());
  let quote = svc.seed(Record::new("quote").field("name", "Q-1").field("quotenumber", "Q-0001")).expect("seed");
  for i in 0..2 {
    svc.seed(Record::new("quotedetail").field("quoteid", EntityReference::new("quote", quote))
                                       .field("quantity", FieldValue::Integer(i + 1)))
       .expect("seed line");
  }
  let profile = DuplicationProfile { root: CloneSpec::new("quote"),
                                     dependents: vec![DependentSpec { child_type: "quotedetail".into(),
                                                                      parent_type: "quote".into(),
                                                                      foreign_key_field: "quoteid".into(),
                                                                      retained_references: vec![],
                                                                      identity_fields: vec![],
                                                                      blob_fields: vec![],
                                                                      computed_fields: vec![],
                                                                      exclusions: vec![] }],
                                     workflow_state: None,
                                     associations: vec![] };
  let dyn_svc: Arc<dyn DataService> = svc.clone();
  let engine = DuplicationEngine::new(dyn_svc, profile).expect("engine");
  assert_eq!(engine.step_names(), vec!["clone-root", "clone-dependents:quotedetail"]);

  let report = engine.run(&EntityReference::new("quote", quote)).expect("run").expect("report");
  let stored = svc.get("quote", report.clone.id).expect("clone");
  assert_eq!(stored.get_str("name"), Some("Q-1"));
  assert_eq!(report.total_dependents(), 2);
  assert!(!report.state_transferred);
}

#[test]
fn invalid_profile_is_rejected_at_construction() {
  let mut profile = DuplicationProfile::opportunity();
  profile.dependents[0].foreign_key_field = String::new();
  let svc: Arc<dyn DataService> = Arc::new(InMemoryDataService::new());
  let err = DuplicationEngine::new(svc, profile).err().expect("invalid");
  assert!(matches!(err, DuplicateError::Unexpected(InvariantError::Profile(_))));
}

#[test]
fn clone_state_loses_initial_path_when_original_has_none() {
  let f = fixture(Options { original_state: false, ..Options::default() });
  f.svc
   .seed(Record::new("opportunitysalesprocess").field("opportunityid", f.original.clone())
                                               .field("processid", f.sales_process))
   .expect("seed state");
  let clone = engine(&f).duplicate(&f.original).expect("duplicate").expect("clone");

  let state = f.state_of(clone.id).expect("clone state");
  assert_eq!(state.get("processid"), Some(&FieldValue::from(f.sales_process)));
  assert_eq!(state.get("traversedpath"), None);

  let updates = f.svc.calls(Operation::Update);
  let sent = updates[0].payload.as_ref().expect("payload");
  assert_eq!(sent.get("traversedpath"), Some(&FieldValue::Null));
}

#[test]
fn root_create_fault_stops_before_any_other_call() {
  let f = fixture(Options::default());
  f.svc.inject_fault(FaultRule::new(Operation::Create, Some("opportunity"), 1));
  let err = engine(&f).duplicate(&f.original).unwrap_err();

  assert!(matches!(err, DuplicateError::Service { stage: Stage::CloneRoot, .. }));
  assert_eq!(f.svc.count("opportunity"), 1);
  assert_eq!(f.svc.calls(Operation::Create).len(), 1);
  assert!(f.svc.calls(Operation::Query).is_empty());
  assert!(f.svc.calls(Operation::Update).is_empty());
  assert!(f.svc.calls(Operation::Associate).is_empty());
}

#[test]
fn workflow_update_fault_skips_association_replication() {
  let f = fixture(Options::default());
  f.svc.inject_fault(FaultRule::new(Operation::Update, None, 1));
  let err = engine(&f).duplicate(&f.original).unwrap_err();

  assert!(matches!(err, DuplicateError::Service { stage: Stage::TransferWorkflowState, .. }));
  assert_eq!(f.svc.calls(Operation::Update).len(), 1);
  assert!(f.svc.calls(Operation::Associate).is_empty());

  // raíz e hijos quedan creados, sin aristas
  let clone = f.svc
               .records_of("opportunity")
               .into_iter()
               .find(|r| r.id != Some(f.original.id))
               .and_then(|r| r.id)
               .expect("partial clone");
  assert_eq!(f.products_of(clone).len(), 3);
  assert!(f.links_of(clone).is_empty());
  let state = f.state_of(clone).expect("clone state");
  assert_eq!(state.get("processid"), Some(&FieldValue::from(f.default_process)));
}
