//! Clap derive structures for the `tsoft` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tsoft -- back-office CLI for T-Soft shops
#[derive(Debug, Parser)]
#[command(
    name = "tsoft",
    version,
    about = "Manage a T-Soft shop from the command line",
    long_about = "Query and update products, categories, customers and orders on a\n\
        T-Soft shop. Every call walks the legacy form API first and falls back\n\
        to the JSON API, so it keeps working across shop deployments.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Shop profile to use
    #[arg(long, short = 'p', env = "TSOFT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Shop API root (overrides profile), e.g. https://shop.example.com/rest1
    #[arg(long, short = 'u', env = "TSOFT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API token (overrides profile and keyring)
    #[arg(long, env = "TSOFT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TSOFT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "TSOFT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "TSOFT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Log request payloads and truncated responses
    #[arg(long, global = true)]
    pub debug: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage products, variants, images and stock
    #[command(alias = "prod", alias = "p")]
    Products(ProductsArgs),

    /// View product categories
    #[command(alias = "cat")]
    Categories(CategoriesArgs),

    /// View customers
    #[command(alias = "cust")]
    Customers(CustomersArgs),

    /// View orders and order lines
    #[command(alias = "ord")]
    Orders(OrdersArgs),

    /// Lookup lists: payment types, cargo companies, order statuses
    #[command(alias = "ref")]
    Reference(ReferenceArgs),

    /// Local warehouse stock bookkeeping
    #[command(alias = "wh")]
    Warehouse(WarehouseArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// Shared paging and filtering arguments for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Max results per page
    #[arg(long, short = 'l', default_value = "50")]
    pub limit: u32,

    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Extra upstream filter, sent verbatim (repeatable)
    /// Example: --filter Status=1 --filter CustomerGroupId=3
    #[arg(long, short = 'f', value_name = "KEY=VALUE")]
    pub filter: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PRODUCTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List products
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Free-text search (JSON API only)
        #[arg(long, short = 's')]
        search: Option<String>,
    },

    /// List products with category names and leading images filled in
    Enhanced {
        #[command(flatten)]
        list: ListArgs,

        /// Skip the image lookups
        #[arg(long)]
        no_images: bool,
    },

    /// Get a product by code
    Get {
        /// Product code
        code: String,
    },

    /// Show a product's color/size variants
    Variants {
        /// Product code
        code: String,

        /// Group variants by this attribute
        #[arg(long, value_enum, default_value = "color")]
        group_by: VariantGrouping,
    },

    /// List product images
    Images {
        /// Product codes
        #[arg(required = true)]
        codes: Vec<String>,

        /// Concurrent lookups when several codes are given
        #[arg(long, default_value = "3")]
        parallel: usize,
    },

    /// Create a product (or many, from a JSON file)
    Create {
        /// Product code
        #[arg(long, required_unless_present = "from_file")]
        code: Option<String>,

        /// Product name
        #[arg(long, required_unless_present = "from_file")]
        name: Option<String>,

        /// Category code, e.g. T4
        #[arg(long, default_value = "T1")]
        category: String,

        /// Price
        #[arg(long, default_value = "0")]
        price: f64,

        /// Initial stock
        #[arg(long, default_value = "0")]
        stock: i64,

        /// JSON file with an array of products to create
        #[arg(long, conflicts_with_all = ["code", "name"])]
        from_file: Option<PathBuf>,
    },

    /// Update product fields
    Update {
        /// Product code
        code: String,

        /// Field to set (repeatable), e.g. --set ProductName=Mug
        #[arg(long, value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Delete a product
    #[command(alias = "rm")]
    Delete {
        /// Product code
        code: String,
    },

    /// Set a product's stock
    Stock {
        /// Product code
        code: String,

        /// New stock quantity
        quantity: i64,
    },

    /// Set a variant's stock
    VariantStock {
        /// Product code
        code: String,

        /// Variant code or sub-product id
        variant: String,

        /// New stock quantity
        quantity: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantGrouping {
    Color,
    Size,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CATEGORIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CategoriesCommand {
    /// List categories as returned by the shop
    #[command(alias = "ls")]
    List,

    /// Show the category tree with full paths
    Tree,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CUSTOMERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CustomersArgs {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Debug, Subcommand)]
pub enum CustomersCommand {
    /// List customers
    #[command(alias = "ls")]
    List(ListArgs),

    /// Get a customer by numeric id
    Get {
        /// Customer id
        id: i64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ORDERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OrdersCommand {
    /// List orders
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Fetch order lines to fill item counts and cities
        #[arg(long, short = 'e')]
        enrich: bool,
    },

    /// Show the lines of one order
    Details {
        /// Numeric order id, or an order code
        order: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REFERENCE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReferenceArgs {
    #[command(subcommand)]
    pub command: ReferenceCommand,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ReferenceCommand {
    /// Payment types
    PaymentTypes,

    /// Cargo companies
    CargoCompanies,

    /// Order statuses
    OrderStatuses,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WAREHOUSE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WarehouseArgs {
    #[command(subcommand)]
    pub command: WarehouseCommand,
}

#[derive(Debug, Subcommand)]
pub enum WarehouseCommand {
    /// Load a product page into the default warehouse and show its stock
    Sync(ListArgs),

    /// Show where a barcode is stocked after syncing a product page
    Locate {
        /// Product barcode
        barcode: String,

        #[command(flatten)]
        list: ListArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
