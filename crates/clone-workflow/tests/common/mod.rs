#![allow(dead_code)]
use record_store::{EntityReference, FieldValue, InMemoryDataService, ProcessBinding, Record, RecordId, RelationshipDef,
                   RelationshipEnd};
use std::sync::Arc;

pub const STAKEHOLDER_REL: &str = "crff8_Stakeholder_Opportunity_Opportunity";

/// Opciones del almacén de prueba.
pub struct Options {
  pub products: usize,
  pub stakeholders: usize,
  /// El original tiene registro de estado de proceso.
  pub original_state: bool,
  /// El almacén crea el registro de estado al crear una oportunidad.
  pub bind_process: bool,
}

impl Default for Options {
  fn default() -> Self {
    Self { products: 3, stakeholders: 2, original_state: true, bind_process: true }
  }
}

pub struct Fixture {
  pub svc: Arc<InMemoryDataService>,
  pub original: EntityReference,
  pub products: Vec<RecordId>,
  pub stakeholders: Vec<RecordId>,
  pub customer: EntityReference,
  pub sales_process: RecordId,
  pub default_process: RecordId,
  pub initial_stage: RecordId,
}

pub fn stakeholder_relationship() -> RelationshipDef {
  RelationshipDef { name: STAKEHOLDER_REL.into(),
                    intersect_entity: "crff8_stakeholder_opportunity".into(),
                    entity1: RelationshipEnd { logical_name: "crff8_stakeholder".into(),
                                               key_attribute: "crff8_stakeholderid".into() },
                    entity2: RelationshipEnd { logical_name: "opportunity".into(),
                                               key_attribute: "opportunityid".into() } }
}

pub fn fixture(opts: Options) -> Fixture {
  let svc = Arc::new(InMemoryDataService::new());
  svc.register_relationship(stakeholder_relationship());
  svc.recalculate_totals_for("opportunityproduct");
  let default_process = RecordId::new_v4();
  let initial_stage = RecordId::new_v4();
  if opts.bind_process {
    svc.bind_process(ProcessBinding { root_type: "opportunity".into(),
                                      state_type: "opportunitysalesprocess".into(),
                                      link_field: "opportunityid".into(),
                                      process_id: default_process,
                                      initial_stage_id: initial_stage });
  }

  let customer = EntityReference::new("account", svc.seed(Record::new("account").field("name", "Contoso")).expect("seed"));
  let owner = EntityReference::new("systemuser", RecordId::new_v4());
  let price_list = EntityReference::new("pricelevel", RecordId::new_v4());
  let id = svc.seed(Record::new("opportunity").field("name", "Big deal")
                                              .field("customerid", customer.clone())
                                              .field("ownerid", owner.clone())
                                              .field("modifiedby", owner)
                                              .field("pricelevelid", price_list)
                                              .field("campaignid", EntityReference::new("campaign", RecordId::new_v4()))
                                              .field("estimatedvalue", FieldValue::Money(1500.0))
                                              .field("statecode", FieldValue::OptionSet(0))
                                              .field("createdon", FieldValue::String("2024-03-01T10:00:00Z".into()))
                                              .field("description", FieldValue::Null))
               .expect("seed opportunity");
  let original = EntityReference::new("opportunity", id);

  let sales_process = RecordId::new_v4();
  if opts.original_state {
    svc.seed(Record::new("opportunitysalesprocess").field("opportunityid", original.clone())
                                                   .field("processid", sales_process)
                                                   .field("activestageid", RecordId::new_v4())
                                                   .field("traversedpath", "stage-a,stage-b"))
       .expect("seed state");
  }

  let unit = EntityReference::new("uom", RecordId::new_v4());
  let mut products = Vec::new();
  for i in 0..opts.products {
    let pid = svc.seed(Record::new("opportunityproduct").field("opportunityid", original.clone())
                                                        .field("productid",
                                                               EntityReference::new("product", RecordId::new_v4()))
                                                        .field("uomid", unit.clone())
                                                        .field("quantity", FieldValue::Decimal(2.0))
                                                        .field("priceperunit", FieldValue::Money(10.0 + i as f64))
                                                        .field("baseamount", FieldValue::Money(99.0))
                                                        .field("extendedamount", FieldValue::Money(99.0))
                                                        .field("tax", FieldValue::Money(1.0))
                                                        .field("manualdiscountamount", FieldValue::Money(0.5))
                                                        .field("description", format!("line {}", i))
                                                        .field("statecode", FieldValue::OptionSet(1))
                                                        .field("entityimage", FieldValue::Binary(vec![1, 2, 3])))
                 .expect("seed product");
    products.push(pid);
  }

  let mut stakeholders = Vec::new();
  for i in 0..opts.stakeholders {
    let sid = svc.seed(Record::new("crff8_stakeholder").field("crff8_name", format!("Stakeholder {}", i)))
                 .expect("seed stakeholder");
    svc.seed_link(STAKEHOLDER_REL, &EntityReference::new("crff8_stakeholder", sid), &original).expect("seed link");
    stakeholders.push(sid);
  }

  Fixture { svc, original, products, stakeholders, customer, sales_process, default_process, initial_stage }
}

impl Fixture {
  /// Hijos cuyo campo de clave foránea apunta a `root`.
  pub fn products_of(&self, root: RecordId) -> Vec<Record> {
    self.svc
        .records_of("opportunityproduct")
        .into_iter()
        .filter(|r| r.get("opportunityid").is_some_and(|v| v.refers_to(&root)))
        .collect()
  }

  pub fn state_of(&self, root: RecordId) -> Option<Record> {
    self.svc
        .records_of("opportunitysalesprocess")
        .into_iter()
        .find(|r| r.get("opportunityid").is_some_and(|v| v.refers_to(&root)))
  }

  pub fn links_of(&self, root: RecordId) -> Vec<RecordId> {
    let mut ids = self.svc.associated_ids(STAKEHOLDER_REL, &EntityReference::new("opportunity", root));
    ids.sort();
    ids
  }
}
