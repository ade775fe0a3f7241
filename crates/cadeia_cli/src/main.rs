//! CLI smoke probe.
//!
//! - Without arguments: prints core linkage info.
//! - With `<db_path> <property_uuid>`: prints the tree payload and main-trunk
//!   table of one property as JSON.
//! - `CADEIA_LOG_DIR` enables rolling file logs in that directory.

use cadeia_core::db::open_db;
use cadeia_core::{
    ChainConfig, ChainTreeService, NoopTrunkCache, OverrideMap, SqliteChainRepository,
    TrunkService,
};
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    println!("cadeia_core ping={}", cadeia_core::ping());
    println!("cadeia_core version={}", cadeia_core::core_version());

    if let Ok(log_dir) = std::env::var("CADEIA_LOG_DIR") {
        if let Err(err) = cadeia_core::init_logging(cadeia_core::default_log_level(), &log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [db_path, property_id] = args.as_slice() else {
        return ExitCode::SUCCESS;
    };

    match dump_property(db_path, property_id) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn dump_property(db_path: &str, property_id: &str) -> Result<(), String> {
    let property_id = Uuid::parse_str(property_id).map_err(|err| err.to_string())?;
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteChainRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let config = ChainConfig::default();

    let tree = ChainTreeService::new(repo, config.clone())
        .build_tree(property_id)
        .map_err(|err| err.to_string())?;
    let table = TrunkService::new(repo, NoopTrunkCache, config)
        .trunk_table(property_id, &OverrideMap::new())
        .map_err(|err| err.to_string())?;

    let payload = serde_json::json!({ "tree": tree, "trunk": table });
    let rendered = serde_json::to_string_pretty(&payload).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}
