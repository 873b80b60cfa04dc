use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clone_workflow::{EngineConfig, EngineFactory, PluginExecutionContext};
use record_store::{DataService, EntityReference, InMemoryDataService, RecordId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Duplicación de registros sobre un almacén en memoria sembrado desde JSON.
///
/// El perfil se toma de `--profile`, de `DUPLICATE_PROFILE_PATH` o, si no
/// hay ninguno, del perfil de oportunidades incorporado.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
  /// Perfil de duplicación en JSON
  #[clap(short, long, global = true)]
  profile: Option<PathBuf>,

  #[clap(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Siembra el almacén y duplica un registro
  Run {
    /// Contenido inicial del almacén (StoreSeed en JSON)
    #[clap(short, long)]
    seed: PathBuf,

    /// Id del registro raíz a duplicar
    #[clap(short, long)]
    target: String,

    /// Tipo lógico del registro; por defecto el tipo raíz del perfil
    #[clap(short, long)]
    entity: Option<String>,

    /// Imprime el reporte completo en JSON en lugar de sólo el id
    #[clap(long)]
    report: bool,
  },
  /// Imprime el perfil activo en JSON
  Profile,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

  let config = match &cli.profile {
    Some(path) => EngineConfig::from_profile_file(path.clone())?,
    None => EngineConfig::from_env()?,
  };

  match cli.command {
    Command::Profile => {
      println!("{}", config.profile.to_json_pretty()?);
    }
    Command::Run { seed, target, entity, report } => {
      let raw = std::fs::read_to_string(&seed).with_context(|| format!("no se pudo leer {}", seed.display()))?;
      let store =
        Arc::new(InMemoryDataService::from_seed_json(&raw).with_context(|| format!("seed inválido: {}", seed.display()))?);
      let svc: Arc<dyn DataService> = store.clone();

      let logical_name = entity.unwrap_or_else(|| config.profile.root_type().to_string());
      let target = EntityReference::new(logical_name, target.parse::<RecordId>().context("id de destino inválido")?);
      info!(record = %target, profile = ?config.profile_path, "iniciando duplicación");

      if report {
        let engine = EngineFactory::from_config(svc, config)?;
        match engine.run(&target)? {
          Some(r) => println!("{}", serde_json::to_string_pretty(&r)?),
          None => println!("{} no es del tipo {}; nada que duplicar", target, engine.root_type()),
        }
      } else {
        let plugin = EngineFactory::plugin(svc, config)?;
        let mut ctx = PluginExecutionContext::with_target(target);
        plugin.execute(&mut ctx)?;
        match ctx.output() {
          Some(id) => println!("{}", id),
          None => println!("sin salida"),
        }
        print_summary(&store, plugin.engine().profile());
      }
    }
  }
  Ok(())
}

/// Cantidad de registros por tipo involucrado en el perfil.
fn print_summary(store: &InMemoryDataService, profile: &clone_policy::DuplicationProfile) {
  let mut types = vec![profile.root_type().to_string()];
  types.extend(profile.dependents.iter().map(|d| d.child_type.clone()));
  types.extend(profile.workflow_state.iter().map(|w| w.state_type.clone()));
  types.extend(profile.associations.iter().map(|a| a.intersect_entity.clone()));
  println!("\nTIPO                                     | REGISTROS");
  println!("-----------------------------------------------------");
  for t in types {
    println!("{:<40} | {}", t, store.count(&t));
  }
}
