// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, bail, Result};

use aclgate::{AccessDecisionEngine, Principal, RequestContext};

fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("header `{raw}` must look like `Name: value`"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("header `{raw}` has an empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn acl_check(
    config: String,
    roles: Vec<String>,
    anonymous: bool,
    method: String,
    uri: String,
    headers: Vec<String>,
) -> Result<()> {
    let engine = AccessDecisionEngine::from_file(&config)?;

    let principal = if anonymous {
        Principal::Anonymous
    } else {
        Principal::authenticated(roles)
    };

    let mut request = RequestContext::from_uri(method, &uri)?;
    for raw in &headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }

    let allowed = engine.is_allowed(&principal, &request);
    println!("{}", if allowed { "allow" } else { "deny" });

    if !allowed {
        std::process::exit(1);
    }
    Ok(())
}

fn acl_parse(expression: String) -> Result<()> {
    let ast = aclgate::predicate::parse(&expression)?;
    println!("{}", serde_json::to_string_pretty(&ast)?);

    // Also validate matcher arguments and patterns.
    aclgate::compile(&expression)?;
    Ok(())
}

#[derive(clap::Subcommand)]
enum AclCommand {
    /// Decide whether a request is allowed.
    Check {
        /// Permissions file (json or yaml).
        #[arg(long, short, value_name = "config.yml")]
        config: String,

        /// Role of the authenticated principal. May be repeated.
        #[arg(long, short, value_name = "role")]
        role: Vec<String>,

        /// Evaluate as an unauthenticated request.
        #[arg(long, short, conflicts_with = "role")]
        anonymous: bool,

        /// Request method.
        #[arg(long, short, default_value = "GET")]
        method: String,

        /// Request header as `Name: value`. May be repeated.
        #[arg(long = "header", short = 'H', value_name = "header")]
        headers: Vec<String>,

        /// Request target, e.g. /api/users?page=2
        uri: String,
    },

    /// Parse a rule expression and print its AST.
    Parse {
        /// Rule expression.
        expression: String,
    },
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: AclCommand,
}

fn main() -> Result<()> {
    use clap::Parser;

    aclgate::init_tracing();

    let cli = Cli::parse();
    match cli.command {
        AclCommand::Check {
            config,
            role,
            anonymous,
            method,
            headers,
            uri,
        } => acl_check(config, role, anonymous, method, uri, headers),
        AclCommand::Parse { expression } => acl_parse(expression),
    }
}
