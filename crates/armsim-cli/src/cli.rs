use std::path::PathBuf;

use armsim_ops::{CollectionKind, KeyType};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "armsim",
    about = "In-memory simulator for hierarchical cloud resource management",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Snapshot file (overrides the config file)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List, register, or remove subscriptions
    Subscriptions(SubscriptionsArgs),
    /// Resolve a subscription by id or display name
    Resolve(ResolveArgs),
    /// Show the entry at a path
    Show(ShowArgs),
    /// Create an entry under a path
    Create(CreateArgs),
    /// List group-level resources, or the children of one
    List(ListArgs),
    /// App Configuration key-values
    Kv(KvArgs),
    /// Key Vault keys
    Key(KeyArgs),
    /// Storage accounts, containers, blobs, and tables
    Storage(StorageArgs),
    /// Cosmos DB accounts, databases, and containers
    Cosmos(CosmosArgs),
    /// Log Analytics workspaces and tables
    Monitor(MonitorArgs),
}

#[derive(Args)]
pub struct SubscriptionsArgs {
    #[command(subcommand)]
    pub action: Option<SubscriptionAction>,
}

#[derive(Subcommand)]
pub enum SubscriptionAction {
    Add {
        id: String,
        name: String,
        #[arg(long)]
        tenant: Option<String>,
    },
    Remove {
        subscription: String,
    },
}

#[derive(Args)]
pub struct ResolveArgs {
    pub subscription: String,
}

#[derive(Args)]
pub struct ShowArgs {
    pub subscription: String,
    /// `kind/name/kind/name/...`
    pub path: String,
}

#[derive(Args)]
pub struct CreateArgs {
    pub subscription: String,
    pub kind: CollectionKind,
    /// `name`, or `key[label]` for key-values
    pub name: String,
    /// Parent path; empty for the subscription root
    #[arg(long, default_value = "")]
    pub parent: String,
    /// `name=value`, repeatable
    #[arg(short = 'p', long = "property")]
    pub properties: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    pub subscription: String,
    pub kind: CollectionKind,
    /// Parent path: `resource_groups/rg/...`, or `kind/name/...` from a
    /// group-level resource
    #[arg(long)]
    pub under: Option<String>,
}

#[derive(Args)]
pub struct KvArgs {
    #[command(subcommand)]
    pub action: KvAction,
}

#[derive(Subcommand)]
pub enum KvAction {
    List {
        subscription: String,
        account: String,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        label: Option<String>,
    },
    Show {
        subscription: String,
        account: String,
        key: String,
        #[arg(long)]
        label: Option<String>,
    },
    Set {
        subscription: String,
        account: String,
        key: String,
        value: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
    },
    Delete {
        subscription: String,
        account: String,
        key: String,
        #[arg(long)]
        label: Option<String>,
    },
    Lock {
        subscription: String,
        account: String,
        key: String,
        #[arg(long)]
        label: Option<String>,
    },
    Unlock {
        subscription: String,
        account: String,
        key: String,
        #[arg(long)]
        label: Option<String>,
    },
}

#[derive(Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub action: KeyAction,
}

#[derive(Subcommand)]
pub enum KeyAction {
    Create {
        subscription: String,
        vault: String,
        name: String,
        #[arg(long, default_value = "RSA")]
        kty: KeyType,
    },
    Get {
        subscription: String,
        vault: String,
        name: String,
    },
    List {
        subscription: String,
        vault: String,
    },
}

#[derive(Args)]
pub struct StorageArgs {
    #[command(subcommand)]
    pub action: StorageAction,
}

#[derive(Subcommand)]
pub enum StorageAction {
    Accounts {
        subscription: String,
    },
    Containers {
        subscription: String,
        account: String,
    },
    Container {
        subscription: String,
        account: String,
        container: String,
    },
    Blobs {
        subscription: String,
        account: String,
        container: String,
    },
    Tables {
        subscription: String,
        account: String,
    },
}

#[derive(Args)]
pub struct CosmosArgs {
    #[command(subcommand)]
    pub action: CosmosAction,
}

#[derive(Subcommand)]
pub enum CosmosAction {
    Accounts {
        subscription: String,
    },
    Create {
        subscription: String,
        resource_group: String,
        name: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        kind: Option<String>,
    },
    Databases {
        subscription: String,
        account: String,
    },
    Containers {
        subscription: String,
        account: String,
        database: String,
    },
}

#[derive(Args)]
pub struct MonitorArgs {
    #[command(subcommand)]
    pub action: MonitorAction,
}

#[derive(Subcommand)]
pub enum MonitorAction {
    Workspaces {
        subscription: String,
    },
    Tables {
        subscription: String,
        resource_group: String,
        /// Workspace name, resource id, or customer id
        workspace: String,
        /// `CustomLog`, or an exact table name
        #[arg(long)]
        table_type: Option<String>,
    },
    TableTypes {
        subscription: String,
        workspace: String,
    },
}

impl Command {
    /// Returns `true` for commands that change the store.
    pub fn mutates(&self) -> bool {
        match self {
            Command::Subscriptions(args) => args.action.is_some(),
            Command::Create(_) => true,
            Command::Kv(args) => !matches!(args.action, KvAction::List { .. } | KvAction::Show { .. }),
            Command::Key(args) => matches!(args.action, KeyAction::Create { .. }),
            Command::Cosmos(args) => matches!(args.action, CosmosAction::Create { .. }),
            Command::Resolve(_)
            | Command::Show(_)
            | Command::List(_)
            | Command::Storage(_)
            | Command::Monitor(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_subscriptions() {
        let cli = Cli::try_parse_from(["armsim", "subscriptions"]).unwrap();
        assert!(matches!(cli.command, Command::Subscriptions(_)));
        assert!(!cli.command.mutates());
    }

    #[test]
    fn parse_subscription_add() {
        let cli = Cli::try_parse_from(["armsim", "subscriptions", "add", "sub-1", "Acme", "--tenant", "t1"]).unwrap();
        if let Command::Subscriptions(args) = &cli.command {
            assert!(matches!(
                &args.action,
                Some(SubscriptionAction::Add { tenant: Some(t), .. }) if t == "t1"
            ));
        } else { panic!("wrong command"); }
        assert!(cli.command.mutates());
    }

    #[test]
    fn parse_create_with_properties() {
        let cli = Cli::try_parse_from([
            "armsim", "create", "Acme", "app_config_stores", "cfg",
            "--parent", "resource_groups/rg1", "-p", "location=eastus",
        ])
        .unwrap();
        if let Command::Create(args) = cli.command {
            assert_eq!(args.kind, CollectionKind::AppConfigStores);
            assert_eq!(args.parent, "resource_groups/rg1");
            assert_eq!(args.properties, vec!["location=eastus"]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_unknown_kind_fails() {
        assert!(Cli::try_parse_from(["armsim", "list", "Acme", "widgets"]).is_err());
    }

    #[test]
    fn parse_list_under() {
        let cli = Cli::try_parse_from(["armsim", "list", "Acme", "blob_containers", "--under", "storage_accounts/acct"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.under.as_deref(), Some("storage_accounts/acct"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_list_under_nested_parent() {
        let cli = Cli::try_parse_from([
            "armsim", "list", "Acme", "blobs", "--under", "storage_accounts/acct/blob_containers/logs",
        ])
        .unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.kind, CollectionKind::Blobs);
            assert_eq!(args.under.as_deref(), Some("storage_accounts/acct/blob_containers/logs"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_cosmos_create_mutates() {
        let cli = Cli::try_parse_from([
            "armsim", "cosmos", "create", "Acme", "rg1", "docs", "--location", "eastus",
        ])
        .unwrap();
        assert!(cli.command.mutates());
        if let Command::Cosmos(CosmosArgs { action: CosmosAction::Create { location, kind, .. } }) = cli.command {
            assert_eq!(location, "eastus");
            assert!(kind.is_none());
        } else { panic!("wrong command"); }
        assert!(Cli::try_parse_from(["armsim", "cosmos", "create", "Acme", "rg1", "docs"]).is_err());
    }

    #[test]
    fn parse_storage_and_monitor_are_read_only() {
        let cli = Cli::try_parse_from(["armsim", "storage", "blobs", "Acme", "acct", "logs"]).unwrap();
        assert!(!cli.command.mutates());
        let cli = Cli::try_parse_from([
            "armsim", "monitor", "tables", "Acme", "rg1", "ops", "--table-type", "CustomLog",
        ])
        .unwrap();
        assert!(!cli.command.mutates());
        if let Command::Monitor(MonitorArgs { action: MonitorAction::Tables { table_type, .. } }) = cli.command {
            assert_eq!(table_type.as_deref(), Some("CustomLog"));
        } else { panic!("wrong command"); }
        assert!(Cli::try_parse_from(["armsim", "monitor", "table-types", "Acme", "ops"]).is_ok());
    }

    #[test]
    fn parse_kv_set() {
        let cli = Cli::try_parse_from(["armsim", "kv", "set", "Acme", "cfg", "color", "red", "--label", "prod"]).unwrap();
        assert!(cli.command.mutates());
        if let Command::Kv(KvArgs { action: KvAction::Set { key, value, label, .. } }) = cli.command {
            assert_eq!(key, "color");
            assert_eq!(value, "red");
            assert_eq!(label.as_deref(), Some("prod"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_kv_list_is_read_only() {
        let cli = Cli::try_parse_from(["armsim", "kv", "list", "Acme", "cfg", "--key", "app*"]).unwrap();
        assert!(!cli.command.mutates());
    }

    #[test]
    fn parse_key_create() {
        let cli = Cli::try_parse_from(["armsim", "key", "create", "Acme", "kv1", "k1", "--kty", "ec"]).unwrap();
        if let Command::Key(KeyArgs { action: KeyAction::Create { kty, .. } }) = cli.command {
            assert_eq!(kty, KeyType::Ec);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from(["armsim", "--verbose", "--format", "json", "--snapshot", "s.json", "subscriptions"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.snapshot, Some(PathBuf::from("s.json")));
    }
}
