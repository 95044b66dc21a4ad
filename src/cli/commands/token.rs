use clap::Subcommand;
use serde_json::json;

use crate::auth::{self, AuthSnapshot};
use crate::cli::{utils, OutputFormat};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Decode a session token and report role and expiry")]
    Inspect {
        #[arg(help = "JWT as stored in the session cookie")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Inspect { token } => inspect(&token, output_format),
    }
}

fn inspect(token: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = auth::decode_claims(token.trim())?;
    let now = auth::now_epoch_seconds();
    let snapshot = AuthSnapshot::from_token(Some(token.trim()));

    let expires_in = claims.exp.map(|exp| exp - now);
    let menu: Vec<&str> = snapshot.menu(now).iter().map(|item| item.path).collect();

    utils::output_fields(
        output_format,
        &json!({
            "userId": claims.user_id,
            "userName": claims.user_name,
            "role": claims.role.as_ref().map(|r| r.as_str().to_string()),
            "exp": claims.exp,
            "expired": claims.is_expired(now),
            "expiresInSecs": expires_in,
            "menu": menu,
        }),
    )
}
