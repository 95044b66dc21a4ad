use clap::Subcommand;
use serde_json::json;

use crate::auth;
use crate::cli::{utils, OutputFormat};
use crate::middleware::edge::{self, EdgeDecision, EdgeState};

#[derive(Subcommand)]
pub enum RouteCommands {
    #[command(about = "Show what the edge middleware does with a page request")]
    Check {
        #[arg(help = "Page path, e.g. /admin/roles")]
        path: String,
        #[arg(long, help = "Session token to evaluate with (anonymous if omitted)")]
        token: Option<String>,
    },
}

pub async fn handle(cmd: RouteCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RouteCommands::Check { path, token } => check(&path, token.as_deref(), output_format),
    }
}

fn check(path: &str, token: Option<&str>, output_format: OutputFormat) -> anyhow::Result<()> {
    let now = auth::now_epoch_seconds();
    let state = EdgeState::classify(token, now);

    let (outcome, target) = match edge::evaluate(path, token, now) {
        EdgeDecision::Next => ("next", None),
        EdgeDecision::Redirect(target) => ("redirect", Some(target)),
    };

    utils::output_fields(
        output_format,
        &json!({
            "path": path,
            "state": format!("{:?}", state),
            "decision": outcome,
            "target": target,
        }),
    )
}
