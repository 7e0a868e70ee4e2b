pub const PORTAL_DISPLAY_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_cli_text() -> String {
    format!(
        "AMR Portal {}\nGenomic surveillance records query engine",
        PORTAL_DISPLAY_VERSION
    )
}
