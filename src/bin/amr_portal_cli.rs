use amr_portal::{
    about,
    aggregate::{self, Aggregates},
    boundary::{self, ArtifactLink, BrowserSession},
    config::PortalConfig,
    dataset::RecordSet,
    engine::{Engine, Operation, PersistedState, PortalEngine, Workflow},
    geo, logging, url_state,
};
use portal_protocol::{MapBounds, MapPoint, RankedCount, Record, ViewState};
use serde::Serialize;
use std::{env, fs, path::Path};

const DEFAULT_STATE_PATH: &str = ".amr_portal_state.json";

#[derive(Serialize)]
struct RankedAggregates {
    amr_classes: Vec<RankedCount>,
    bgc_types: Vec<RankedCount>,
    regions: Vec<RankedCount>,
}

impl From<&Aggregates> for RankedAggregates {
    fn from(value: &Aggregates) -> Self {
        Self {
            amr_classes: aggregate::ranked(&value.amr_classes),
            bgc_types: aggregate::ranked(&value.bgc_types),
            regions: aggregate::ranked(&value.regions),
        }
    }
}

#[derive(Serialize)]
struct MapSummary {
    center: (f64, f64),
    bounds: Option<MapBounds>,
    points: Vec<MapPoint>,
}

#[derive(Serialize)]
struct FilterOptions {
    regions: Vec<String>,
    amr_classes: Vec<String>,
}

#[derive(Serialize)]
struct RecordLinks {
    accession: String,
    browser_url: String,
    artifacts: Vec<ArtifactLink>,
}

#[derive(Serialize)]
struct BrowserLaunch {
    url: String,
    session: BrowserSession,
}

struct GlobalArgs {
    state_path: String,
    dataset: Option<String>,
    config: Option<String>,
    cmd_idx: usize,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  amr_portal_cli --version\n  \
  amr_portal_cli [GLOBAL] capabilities\n  \
  amr_portal_cli [GLOBAL] config [OUTPUT]\n  \
  amr_portal_cli [GLOBAL] view|rows|stats|aggregates|graph|novelty|map|options\n  \
  amr_portal_cli [GLOBAL] op '<operation-json>'\n  \
  amr_portal_cli [GLOBAL] workflow '<workflow-json>'\n  \
  amr_portal_cli [GLOBAL] export-csv|export-json|export-graph-svg OUTPUT\n  \
  amr_portal_cli [GLOBAL] template-csv [OUTPUT]\n  \
  amr_portal_cli [GLOBAL] artifacts|browser ACCESSION\n  \
  amr_portal_cli [GLOBAL] url-encode\n  \
  amr_portal_cli [GLOBAL] url-decode QUERY\n\n  \
  GLOBAL: [--state PATH] [--dataset PATH] [--config PATH]\n  \
  Tip: pass @file.json instead of inline JSON"
    );
}

fn load_json_arg(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(path).map_err(|e| format!("Could not read JSON file '{path}': {e}"))
    } else {
        Ok(value.to_string())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_global_args(args: &[String]) -> Result<GlobalArgs, String> {
    let mut global = GlobalArgs {
        state_path: DEFAULT_STATE_PATH.to_string(),
        dataset: None,
        config: None,
        cmd_idx: 1,
    };
    while global.cmd_idx < args.len() {
        let flag = args[global.cmd_idx].as_str();
        if !matches!(flag, "--state" | "--dataset" | "--config") {
            break;
        }
        let value = args
            .get(global.cmd_idx + 1)
            .cloned()
            .ok_or_else(|| format!("Missing value for {flag}"))?;
        match flag {
            "--state" => global.state_path = value,
            "--dataset" => global.dataset = Some(value),
            _ => global.config = Some(value),
        }
        global.cmd_idx += 2;
    }
    Ok(global)
}

fn load_state(path: &str) -> Result<ViewState, String> {
    if Path::new(path).exists() {
        ViewState::load_from_path(path).map_err(|e| e.to_string())
    } else {
        Ok(ViewState::default())
    }
}

fn load_records(global: &GlobalArgs, config: &PortalConfig) -> Result<RecordSet, String> {
    match global.dataset.as_ref().or(config.dataset_path.as_ref()) {
        Some(path) => RecordSet::load_from_path(path).map_err(|e| format!("{e:#}")),
        None => RecordSet::reference().map_err(|e| format!("{e:#}")),
    }
}

fn load_engine(global: &GlobalArgs, config: &PortalConfig) -> Result<PortalEngine, String> {
    let records = load_records(global, config)?;
    if Path::new(&global.state_path).exists() {
        let state = load_state(&global.state_path)?;
        Ok(PortalEngine::from_state(records, state, config))
    } else {
        Ok(PortalEngine::with_config(records, config))
    }
}

fn require_arg<'a>(args: &'a [String], idx: usize, what: &str) -> Result<&'a str, String> {
    match args.get(idx) {
        Some(value) => Ok(value.as_str()),
        None => {
            usage();
            Err(format!("Missing {what}"))
        }
    }
}

fn find_record<'a>(records: &'a RecordSet, accession: &str) -> Result<&'a Record, String> {
    records
        .get(accession)
        .ok_or_else(|| format!("Accession '{accession}' not found in dataset"))
}

fn record_links(
    records: &RecordSet,
    config: &PortalConfig,
    accession: &str,
) -> Result<RecordLinks, String> {
    let record = find_record(records, accession)?;
    Ok(RecordLinks {
        accession: record.accession.clone(),
        browser_url: boundary::browser_url(
            &config.browser_base,
            Some(record),
            &config.browser_locus,
        ),
        artifacts: boundary::artifact_links(&config.api_base, &record.accession),
    })
}

fn browser_launch(
    records: &RecordSet,
    config: &PortalConfig,
    accession: &str,
) -> Result<BrowserLaunch, String> {
    let record = find_record(records, accession)?;
    Ok(BrowserLaunch {
        url: boundary::browser_url(&config.browser_base, Some(record), &config.browser_locus),
        session: boundary::annotation_session(record, &config.api_base, &config.browser_locus),
    })
}

fn write_output(path: &str, text: &str, what: &str) -> Result<(), String> {
    fs::write(path, text).map_err(|e| format!("Could not write {what} '{path}': {e}"))?;
    println!("Wrote {what} to '{path}'");
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let global = parse_global_args(&args)?;
    let config = PortalConfig::resolve(global.config.as_deref()).map_err(|e| e.to_string())?;
    if let Err(e) = logging::init_logging(&config.log_filter) {
        eprintln!("{e}");
    }
    let cmd_idx = global.cmd_idx;
    if args.len() <= cmd_idx {
        usage();
        return Err("Missing command".to_string());
    }
    let command = &args[cmd_idx];

    match command.as_str() {
        "capabilities" => print_json(&PortalEngine::capabilities()),
        "config" => match args.get(cmd_idx + 1) {
            Some(output) => {
                config.save_to_path(output).map_err(|e| e.to_string())?;
                println!("Wrote resolved configuration to '{output}'");
                Ok(())
            }
            None => print_json(&config),
        },
        "view" => print_json(&load_engine(&global, &config)?.view()),
        "rows" => print_json(&load_engine(&global, &config)?.rows()),
        "stats" => print_json(&load_engine(&global, &config)?.summary()),
        "aggregates" => {
            let engine = load_engine(&global, &config)?;
            let aggregates = Aggregates::compute(&engine.rows());
            print_json(&RankedAggregates::from(&aggregates))
        }
        "graph" => print_json(&load_engine(&global, &config)?.graph()),
        "novelty" => print_json(&load_engine(&global, &config)?.novelty()),
        "map" => {
            let engine = load_engine(&global, &config)?;
            let points = geo::map_points(&engine.rows());
            let bounds = geo::map_bounds(&points, geo::BOUNDS_PADDING);
            print_json(&MapSummary {
                center: geo::map_center(bounds.as_ref()),
                bounds,
                points,
            })
        }
        "options" => {
            let records = load_records(&global, &config)?;
            print_json(&FilterOptions {
                regions: records.regions(),
                amr_classes: records.amr_classes(),
            })
        }
        "export-csv" | "export-json" | "export-graph-svg" => {
            let output = require_arg(&args, cmd_idx + 1, "output path")?;
            let engine = load_engine(&global, &config)?;
            let text = match command.as_str() {
                "export-csv" => portal_render::records_to_csv(&engine.rows()),
                "export-json" => portal_render::records_to_json(&engine.rows()),
                _ => Ok(portal_render::export_similarity_svg(&engine.graph())),
            }
            .map_err(|e| e.to_string())?;
            write_output(output, &text, "export")
        }
        "template-csv" => {
            let records = load_records(&global, &config)?;
            let example = records
                .records()
                .first()
                .ok_or_else(|| "Dataset is empty; no example row for the template".to_string())?;
            let text = portal_render::csv_template(example).map_err(|e| e.to_string())?;
            match args.get(cmd_idx + 1) {
                Some(output) => write_output(output, &text, "CSV template"),
                None => {
                    println!("{text}");
                    Ok(())
                }
            }
        }
        "artifacts" => {
            let accession = require_arg(&args, cmd_idx + 1, "accession")?;
            let records = load_records(&global, &config)?;
            print_json(&record_links(&records, &config, accession)?)
        }
        "browser" => {
            let accession = require_arg(&args, cmd_idx + 1, "accession")?;
            let records = load_records(&global, &config)?;
            print_json(&browser_launch(&records, &config, accession)?)
        }
        "url-encode" => {
            let state = load_state(&global.state_path)?;
            println!("{}", url_state::encode(&state));
            Ok(())
        }
        "url-decode" => {
            let query = require_arg(&args, cmd_idx + 1, "query string")?;
            let state = url_state::decode(query);
            state
                .save_to_path(&global.state_path)
                .map_err(|e| e.to_string())?;
            print_json(&state)
        }
        "op" => {
            let json = load_json_arg(require_arg(&args, cmd_idx + 1, "operation JSON")?)?;
            let op: Operation =
                serde_json::from_str(&json).map_err(|e| format!("Invalid operation JSON: {e}"))?;

            let mut engine = load_engine(&global, &config)?;
            let result = engine.apply(op).map_err(|e| e.to_string())?;
            engine
                .state()
                .save_to_path(&global.state_path)
                .map_err(|e| e.to_string())?;
            print_json(&result)
        }
        "workflow" => {
            let json = load_json_arg(require_arg(&args, cmd_idx + 1, "workflow JSON")?)?;
            let workflow: Workflow =
                serde_json::from_str(&json).map_err(|e| format!("Invalid workflow JSON: {e}"))?;

            let mut engine = load_engine(&global, &config)?;
            let results = engine.apply_workflow(workflow).map_err(|e| e.to_string())?;
            engine
                .state()
                .save_to_path(&global.state_path)
                .map_err(|e| e.to_string())?;
            print_json(&results)
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
