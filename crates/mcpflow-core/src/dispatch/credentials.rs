//! Per-provider credential shaping
//!
//! Each tool server expects its credentials in a particular place inside
//! the tool arguments - most under a `__credentials__` object, a few as
//! inline top-level fields. The table maps server name to a shaping
//! function; adding a server means adding one entry, the dispatcher core
//! never changes. Unknown server names pass arguments through unmodified.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

/// Mutates tool arguments to carry the server's expected credential fields
pub type CredentialShaper = fn(&mut Map<String, Value>, &Value);

/// Credential string from the bundle, or empty string when absent
fn field(bundle: &Value, key: &str) -> Value {
    Value::String(
        bundle
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    )
}

/// Some bundles nest the secrets one level down under `credentials`
fn unwrap_nested(bundle: &Value) -> Value {
    bundle.get("credentials").cloned().unwrap_or_else(|| bundle.clone())
}

fn confluence(args: &mut Map<String, Value>, bundle: &Value) {
    let creds = unwrap_nested(bundle);
    args.insert(
        "__credentials__".to_string(),
        json!({
            "api_token": field(&creds, "api_token"),
            "user_email": field(&creds, "user_email"),
            "base_url": field(&creds, "base_url"),
        }),
    );
}

fn wordpress(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert("siteUrl".to_string(), field(bundle, "siteUrl"));
    args.insert("username".to_string(), field(bundle, "username"));
    args.insert("password".to_string(), field(bundle, "password"));
}

fn zoom(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({
            "account_id": field(bundle, "account_id"),
            "client_id": field(bundle, "client_id"),
            "client_secret": field(bundle, "client_secret"),
        }),
    );
}

fn gdrive(args: &mut Map<String, Value>, bundle: &Value) {
    // Supports both direct and web-application credential formats
    let creds = bundle
        .get("web")
        .cloned()
        .unwrap_or_else(|| bundle.clone());
    args.insert("__credentials__".to_string(), creds);
}

fn salesforce(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert("username".to_string(), field(bundle, "username"));
    args.insert("password".to_string(), field(bundle, "password"));
    args.insert("token".to_string(), field(bundle, "token"));
}

fn slack(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({
            "slack_bot_token": field(bundle, "slack_bot_token"),
            "slack_team_id": field(bundle, "slack_team_id"),
            "slack_channel_ids": field(bundle, "slack_channel_ids"),
        }),
    );
}

fn jira(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({
            "jira_email": field(bundle, "jira_email"),
            "jira_api_token": field(bundle, "jira_api_token"),
            "jira_domain": field(bundle, "jira_domain"),
            "project_key": field(bundle, "project_key"),
        }),
    );
}

fn zendesk(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({
            "email": field(bundle, "email"),
            "token": field(bundle, "token"),
            "subdomain": field(bundle, "subdomain"),
        }),
    );
}

fn hubspot(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({ "access_token": field(bundle, "access_token") }),
    );
}

fn notion(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({ "notion_token": field(bundle, "notion_token") }),
    );
}

fn clickup(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({ "api_token": field(bundle, "api_token") }),
    );
}

fn dropbox(args: &mut Map<String, Value>, bundle: &Value) {
    let creds = unwrap_nested(bundle);
    let pick = |snake: &str, camel: &str| -> Value {
        let value = field(&creds, snake);
        if value.as_str() == Some("") {
            field(&creds, camel)
        } else {
            value
        }
    };
    args.insert(
        "__credentials__".to_string(),
        json!({
            "app_key": pick("app_key", "appKey"),
            "app_secret": pick("app_secret", "appSecret"),
            "refresh_token": pick("refresh_token", "refreshToken"),
        }),
    );
}

fn figma(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({
            "api_token": field(bundle, "api_token"),
            "figma_url": field(bundle, "figma_url"),
            "depth": bundle.get("depth").cloned().unwrap_or(json!(0)),
        }),
    );
}

fn airtable(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({ "api_key": field(bundle, "api_key") }),
    );
}

fn shopify(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({
            "access_token": field(bundle, "access_token"),
            "domain": field(bundle, "domain"),
        }),
    );
}

fn linkedin(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert("accessToken".to_string(), field(bundle, "access_token"));
}

fn x(args: &mut Map<String, Value>, bundle: &Value) {
    let creds = unwrap_nested(bundle);
    args.insert(
        "__credentials__".to_string(),
        json!({
            "app_key": field(&creds, "app_key"),
            "app_secret": field(&creds, "app_secret"),
            "access_token": field(&creds, "access_token"),
            "access_token_secret": field(&creds, "access_token_secret"),
        }),
    );
}

fn instagram(args: &mut Map<String, Value>, bundle: &Value) {
    args.insert(
        "__credentials__".to_string(),
        json!({
            "accessToken": field(bundle, "accessToken"),
            "businessAccountId": field(bundle, "businessAccountId"),
            "appId": field(bundle, "appId"),
            "appSecret": field(bundle, "appSecret"),
        }),
    );
}

static SHAPERS: Lazy<HashMap<&'static str, CredentialShaper>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, CredentialShaper> = HashMap::new();
    table.insert("CONFLUENCE", confluence);
    table.insert("WORDPRESS", wordpress);
    table.insert("ZOOMMCP", zoom);
    table.insert("G_DRIVE", gdrive);
    table.insert("SALESFORCE_MCP", salesforce);
    table.insert("SLACK", slack);
    table.insert("JIRA", jira);
    table.insert("ZENDESK_MCP", zendesk);
    table.insert("HUBSPOT_MCP", hubspot);
    table.insert("NOTION_MCP", notion);
    table.insert("CLICKUP_MCP", clickup);
    table.insert("DROPBOX", dropbox);
    table.insert("FIGMA_MCP", figma);
    table.insert("AIRTABLE", airtable);
    table.insert("SHOPIFY", shopify);
    table.insert("LINKEDIN", linkedin);
    table.insert("X_MCP", x);
    table.insert("INSTAGRAM_MCP", instagram);
    table
});

/// Inject the server's expected credential fields into the arguments.
///
/// `bundle` is the per-server slice of the request's credential map.
/// Non-object arguments and unknown servers are left untouched.
pub fn shape_credentials(server: &str, args: &mut Value, bundle: &Value) {
    let Some(shaper) = SHAPERS.get(server) else {
        return;
    };
    if let Some(map) = args.as_object_mut() {
        shaper(map, bundle);
    }
}
