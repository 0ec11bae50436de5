// [apps/orchestrator/src/bin/main.rs]
/**
 * =================================================================
 * APARATO: ORCHESTRATOR SHELL
 * CLASIFICACION: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: PARSEO DE ARGUMENTOS, CARGA DE .ENV Y DISPARO DEL
 *                  PIPELINE DE PRE-FILTRADO
 * =================================================================
 */

use anyhow::{Context, Result};
use clap::Parser;
use hashfilter_domain_feeds::{Feed, LocalFileFeed, SyntheticIpv4Feed};
use hashfilter_domain_models::{RunConfig, Vendor};
use hashfilter_orchestrator::Orchestrator;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Configuracion de linea de comandos del pipeline de pre-filtrado de
/// hash prefixes contra los Safe Browsing de Google y Yandex.
#[derive(Parser, Debug)]
#[command(
    author = "Raz Podesta <metaShark Tech>",
    version,
    about = "Ingesta feeds de URLs, refresca prefijos por vendor y confirma sospechosos contra Safe Browsing."
)]
struct CommandArguments {
    /// Tags de feed a ingerir en esta corrida (p. ej. "ipv4", "local").
    #[arg(long, value_delimiter = ',', default_value = "ipv4")]
    sources: Vec<String>,

    /// Habilita la obtencion remota de prefijos via Update API.
    #[arg(long, default_value_t = false)]
    fetch: bool,

    /// Vendors activos en esta corrida ("Google", "Yandex").
    #[arg(long, value_delimiter = ',', default_value = "Google,Yandex")]
    vendors: Vec<String>,

    /// Epoch en segundos usado como "now" para `listed_at` / `*_flagged_at`.
    #[arg(long)]
    update_time: i64,

    /// Directorio base donde residen los archivos `.db` por store.
    #[arg(long, default_value = "databases")]
    databases_dir: PathBuf,

    /// Nombre de store para un feed de archivo local opcional.
    #[arg(long)]
    local_feed_name: Option<String>,

    /// Ruta del archivo local con un hostname normalizado por linea.
    #[arg(long)]
    local_feed_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = CommandArguments::parse();
    info!("starting hashfilter-orchestrator run");

    let vendors: HashSet<Vendor> = cli
        .vendors
        .iter()
        .map(|tag| Vendor::from_str(tag).with_context(|| format!("unrecognized vendor tag '{tag}'")))
        .collect::<Result<_>>()?;

    let mut api_keys = HashMap::new();
    if vendors.contains(&Vendor::Google) {
        api_keys.insert(Vendor::Google, std::env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY not set")?);
    }
    if vendors.contains(&Vendor::Yandex) {
        api_keys.insert(Vendor::Yandex, std::env::var("YANDEX_API_KEY").context("YANDEX_API_KEY not set")?);
    }

    let config = RunConfig {
        sources: cli.sources.into_iter().collect(),
        fetch: cli.fetch,
        vendors,
        update_time: cli.update_time,
        databases_dir: cli.databases_dir,
        api_keys,
    };

    let mut feeds: Vec<Box<dyn Feed>> = vec![Box::new(SyntheticIpv4Feed::new())];
    if let (Some(name), Some(path)) = (cli.local_feed_name, cli.local_feed_path) {
        feeds.push(Box::new(LocalFileFeed::new(name, path)));
    }

    let orchestrator = Orchestrator::new(config, feeds)?;
    let exported = orchestrator.run().await?;

    info!("run finished, {} urls currently flagged", exported.len());
    for url in exported {
        println!("{url}");
    }

    Ok(())
}
