use anyhow::{anyhow, Context};
use armsim_ops::{
    ContainerDetails, KeyDetails, KeyListItem, KeyValueItem, Node, ResourceStore, ResourceSummary,
    Simulator, SubscriptionSummary,
};
use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::cli::*;
use crate::config::SimConfig;

/// Config from `--config` (or defaults) with command-line overrides applied.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(snapshot) = &cli.snapshot {
        config.snapshot = snapshot.clone();
    }
    if cli.verbose {
        config.log_level = "debug".into();
    }
    Ok(config)
}

pub fn run_command(cli: Cli, config: &SimConfig) -> anyhow::Result<()> {
    let mut sim = Simulator::new(open_store(config)?);
    let mutates = cli.command.mutates();
    let out = Output { format: cli.format };

    match cli.command {
        Command::Subscriptions(args) => cmd_subscriptions(&mut sim, args, &out)?,
        Command::Resolve(args) => {
            let found = sim.resolve(&args.subscription)?;
            out.emit(&found, |s| print_subscription(s))?;
        }
        Command::Show(args) => {
            let node = sim.show(&args.subscription, &args.path)?;
            out.emit(&node, print_node)?;
        }
        Command::Create(args) => {
            let properties = parse_properties(&args.properties)?;
            let node = sim.create_resource(
                &args.subscription,
                &args.parent,
                args.kind,
                &args.name,
                properties,
            )?;
            out.emit(&node, |node| {
                println!("{} Created {} {}", "✓".green().bold(), node.kind, node.key.to_string().yellow());
                if let Some(id) = &node.id {
                    println!("  Id: {}", id.to_string().cyan());
                }
            })?;
        }
        Command::List(args) => {
            let listed = match &args.under {
                Some(under) => sim.list_children(&args.subscription, under, args.kind)?,
                None => sim.list_group_resources(&args.subscription, args.kind)?,
            };
            out.emit(&listed, |items| print_resources(items))?;
        }
        Command::Kv(args) => cmd_kv(&mut sim, args.action, &out)?,
        Command::Key(args) => cmd_key(&mut sim, args.action, &out)?,
        Command::Storage(args) => cmd_storage(&sim, args.action, &out)?,
        Command::Cosmos(args) => cmd_cosmos(&mut sim, args.action, &out)?,
        Command::Monitor(args) => cmd_monitor(&sim, args.action, &out)?,
    }

    if mutates && config.autosave {
        sim.store().save(&config.snapshot)?;
    }
    Ok(())
}

fn open_store(config: &SimConfig) -> anyhow::Result<ResourceStore> {
    if config.snapshot.exists() {
        ResourceStore::load(&config.snapshot)
            .with_context(|| format!("loading snapshot {}", config.snapshot.display()))
    } else {
        debug!(path = %config.snapshot.display(), "no snapshot, starting empty");
        Ok(ResourceStore::new())
    }
}

fn cmd_subscriptions(sim: &mut Simulator, args: SubscriptionsArgs, out: &Output) -> anyhow::Result<()> {
    match args.action {
        Some(SubscriptionAction::Add { id, name, tenant }) => {
            let added = sim.add_subscription(&id, &name, tenant.as_deref())?;
            out.emit(&added, |s| {
                println!("{} Registered subscription {}", "✓".green().bold(), s.display_name.bold());
            })
        }
        Some(SubscriptionAction::Remove { subscription }) => {
            sim.remove_subscription(&subscription)?;
            info!(subscription = %subscription, "removed");
            out.done(&format!("Removed subscription {}", subscription.bold()))
        }
        None => {
            let all = sim.subscriptions();
            out.emit(&all, |all| {
                if all.is_empty() {
                    println!("No subscriptions.");
                }
                all.iter().for_each(print_subscription);
            })
        }
    }
}

fn cmd_kv(sim: &mut Simulator, action: KvAction, out: &Output) -> anyhow::Result<()> {
    match action {
        KvAction::List { subscription, account, key, label } => {
            let items = sim.kv_list(&subscription, &account, key.as_deref(), label.as_deref())?;
            out.emit(&items, |items| {
                if items.is_empty() {
                    println!("No key-values.");
                }
                items.iter().for_each(print_key_value);
            })
        }
        KvAction::Show { subscription, account, key, label } => {
            let item = sim.kv_show(&subscription, &account, &key, label.as_deref())?;
            out.emit(&item, print_key_value)
        }
        KvAction::Set { subscription, account, key, value, label, content_type } => {
            let item = sim.kv_set(
                &subscription,
                &account,
                &key,
                &value,
                label.as_deref(),
                content_type.as_deref(),
            )?;
            out.emit(&item, print_key_value)
        }
        KvAction::Delete { subscription, account, key, label } => {
            sim.kv_delete(&subscription, &account, &key, label.as_deref())?;
            out.done(&format!("Deleted {}", key.yellow()))
        }
        KvAction::Lock { subscription, account, key, label } => {
            let item = sim.kv_lock(&subscription, &account, &key, label.as_deref())?;
            out.emit(&item, print_key_value)
        }
        KvAction::Unlock { subscription, account, key, label } => {
            let item = sim.kv_unlock(&subscription, &account, &key, label.as_deref())?;
            out.emit(&item, print_key_value)
        }
    }
}

fn cmd_key(sim: &mut Simulator, action: KeyAction, out: &Output) -> anyhow::Result<()> {
    match action {
        KeyAction::Create { subscription, vault, name, kty } => {
            let key = sim.key_create(&subscription, &vault, &name, kty)?;
            out.emit(&key, print_key)
        }
        KeyAction::Get { subscription, vault, name } => {
            let key = sim.key_get(&subscription, &vault, &name)?;
            out.emit(&key, print_key)
        }
        KeyAction::List { subscription, vault } => {
            let keys = sim.key_list(&subscription, &vault)?;
            out.emit(&keys, |keys| {
                if keys.is_empty() {
                    println!("No keys.");
                }
                keys.iter().for_each(print_key_item);
            })
        }
    }
}

fn cmd_storage(sim: &Simulator, action: StorageAction, out: &Output) -> anyhow::Result<()> {
    match action {
        StorageAction::Accounts { subscription } => {
            let accounts = sim.storage_account_list(&subscription)?;
            out.emit(&accounts, |items| print_resources(items))
        }
        StorageAction::Containers { subscription, account } => {
            let containers = sim.blob_container_list(&subscription, &account)?;
            out.emit(&containers, |items| print_resources(items))
        }
        StorageAction::Container { subscription, account, container } => {
            let details = sim.blob_container_details(&subscription, &account, &container)?;
            out.emit(&details, print_container)
        }
        StorageAction::Blobs { subscription, account, container } => {
            let blobs = sim.blob_list(&subscription, &account, &container)?;
            out.emit(&blobs, |items| print_resources(items))
        }
        StorageAction::Tables { subscription, account } => {
            let tables = sim.storage_table_list(&subscription, &account)?;
            out.emit(&tables, |names| print_names(names, "No tables."))
        }
    }
}

fn cmd_cosmos(sim: &mut Simulator, action: CosmosAction, out: &Output) -> anyhow::Result<()> {
    match action {
        CosmosAction::Accounts { subscription } => {
            let accounts = sim.cosmos_account_list(&subscription)?;
            out.emit(&accounts, |items| print_resources(items))
        }
        CosmosAction::Create { subscription, resource_group, name, location, kind } => {
            let created = sim.cosmos_account_create(
                &subscription,
                &resource_group,
                &name,
                &location,
                kind.as_deref(),
            )?;
            out.emit(&created, |account| {
                println!("{} Created Cosmos DB account {}", "✓".green().bold(), account.name.yellow());
                if let Some(id) = &account.id {
                    println!("  Id: {}", id.cyan());
                }
            })
        }
        CosmosAction::Databases { subscription, account } => {
            let databases = sim.cosmos_database_list(&subscription, &account)?;
            out.emit(&databases, |items| print_resources(items))
        }
        CosmosAction::Containers { subscription, account, database } => {
            let containers = sim.cosmos_container_list(&subscription, &account, &database)?;
            out.emit(&containers, |items| print_resources(items))
        }
    }
}

fn cmd_monitor(sim: &Simulator, action: MonitorAction, out: &Output) -> anyhow::Result<()> {
    match action {
        MonitorAction::Workspaces { subscription } => {
            let workspaces = sim.workspace_list(&subscription)?;
            out.emit(&workspaces, |items| print_resources(items))
        }
        MonitorAction::Tables { subscription, resource_group, workspace, table_type } => {
            let tables = sim.workspace_table_list(
                &subscription,
                &resource_group,
                &workspace,
                table_type.as_deref(),
            )?;
            out.emit(&tables, |items| print_resources(items))
        }
        MonitorAction::TableTypes { subscription, workspace } => {
            let types = sim.table_type_list(&subscription, &workspace)?;
            out.emit(&types, |names| print_names(names, "No table types."))
        }
    }
}

// ---- Argument parsing ----

/// `name=value` pairs. Values that parse as JSON keep their type.
fn parse_properties(pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    pairs
        .iter()
        .map(|pair| {
            let (name, raw) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("property '{pair}' is not name=value"))?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
            Ok((name.to_string(), value))
        })
        .collect()
}

// ---- Output ----

struct Output {
    format: OutputFormat,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(value),
        }
        Ok(())
    }

    fn done(&self, message: &str) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::json!({ "ok": true })),
            OutputFormat::Text => println!("{} {}", "✓".green().bold(), message),
        }
        Ok(())
    }
}

fn print_subscription(s: &SubscriptionSummary) {
    println!(
        "{}  {}  ({}, {} resource groups)",
        s.subscription_id.yellow(),
        s.display_name.bold(),
        s.state.as_deref().unwrap_or("unknown"),
        s.resource_groups
    );
}

fn print_node(node: &Node) {
    println!("{} {}", node.kind.to_string().dimmed(), node.key.to_string().yellow().bold());
    if let Some(id) = &node.id {
        println!("  Id: {}", id.to_string().cyan());
    }
    if let Some(version) = &node.version {
        println!("  ETag: {}  Modified: {}", version.etag.short(), version.last_modified);
    }
    if node.locked {
        println!("  {}", "locked".red());
    }
    for (name, value) in &node.properties {
        println!("  {name}: {value}");
    }
    for (kind, children) in &node.children {
        println!("  {}: {} entries", kind.to_string().dimmed(), children.len());
    }
}

fn print_resources(items: &[ResourceSummary]) {
    if items.is_empty() {
        println!("No resources.");
    }
    for item in items {
        match &item.resource_group {
            Some(group) => println!("{}  {}", item.name.yellow(), group.dimmed()),
            None => println!("{}", item.name.yellow()),
        }
    }
}

fn print_names(names: &[String], empty: &str) {
    if names.is_empty() {
        println!("{empty}");
    }
    names.iter().for_each(|name| println!("{}", name.yellow()));
}

fn print_container(details: &ContainerDetails) {
    println!("{} {}", "container".dimmed(), details.name.yellow().bold());
    println!("  ETag: {}  Modified: {}", details.etag, details.last_modified);
    println!("  Lease: {} ({})", details.lease_status, details.lease_state);
    if let Some(access) = &details.public_access {
        println!("  Public access: {access}");
    }
    if details.has_immutability_policy || details.has_legal_hold {
        println!("  {}", "retention hold".red());
    }
}

fn print_key_value(item: &KeyValueItem) {
    let label = item.label.as_deref().map_or_else(|| "(no label)".dimmed().to_string(), |l| format!("[{l}]"));
    let lock = if item.locked { " locked".red().to_string() } else { String::new() };
    println!(
        "{} {} = {}{}",
        item.key.yellow(),
        label,
        item.value.as_deref().unwrap_or(""),
        lock
    );
}

fn print_key(key: &KeyDetails) {
    println!("{} {} ({})", "key".dimmed(), key.name.yellow().bold(), key.kty);
    println!("  Kid: {}", key.kid.cyan());
    println!("  Ops: {}", key.key_ops.join(", "));
    println!("  Enabled: {}", key.attributes.enabled);
}

fn print_key_item(key: &KeyListItem) {
    println!("{}  {}", key.name.yellow(), key.kid.dimmed());
}
