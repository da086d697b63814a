use clap::Args;
use serde_json::json;

use crate::auth::JwtIdentityProvider;
use crate::cli::{utils, OutputFormat};
use crate::config;
use crate::types::{Permission, Role};

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Subject (user name) the token identifies")]
    pub subject: String,

    #[arg(long, default_value = "user", help = "Role: user, writer, editor or admin")]
    pub role: Role,

    #[arg(long, help = "Explicit permission (repeatable); replaces the role defaults")]
    pub permission: Vec<Permission>,

    #[arg(long, help = "Expiry in hours (defaults to JWT_EXPIRY_HOURS)")]
    pub expiry_hours: Option<u64>,
}

pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let expiry_hours = args.expiry_hours.unwrap_or(security.jwt_expiry_hours);
    let provider = JwtIdentityProvider::new(&security.jwt_secret, expiry_hours)?;

    let mut claims = provider.claims_for(args.subject, args.role);
    if !args.permission.is_empty() {
        claims = claims.with_permissions(args.permission);
    }
    let token = provider.issue(&claims)?;

    match output_format {
        OutputFormat::Json => utils::output_success(
            &output_format,
            "Token issued",
            Some(json!({ "token": token, "claims": claims })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
