//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Import bank statements and classify them with merchant rules
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Personal finance tracker: statement import and merchant rules", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides the config file and TALLY_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// User to act as (overrides the config file and TALLY_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the raw response envelope as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and provision default categories, merchants and mappings
    Init,

    /// Import a CSV, TSV or spreadsheet file
    Import {
        /// File to import
        #[arg(short, long)]
        file: PathBuf,

        /// Saved mapping to use (name or id)
        #[arg(short, long)]
        mapping: String,

        /// Account name (defaults to the mapping's)
        #[arg(short, long)]
        account: Option<String>,

        /// Treat the first row as a header
        #[arg(long, conflicts_with = "no_header")]
        header: bool,

        /// Treat the first row as data
        #[arg(long)]
        no_header: bool,
    },

    /// Manage column mappings (list, show, add, delete)
    Mappings {
        #[command(subcommand)]
        action: Option<MappingsAction>,
    },

    /// Manage merchant rules (list, add, update, delete)
    Merchants {
        #[command(subcommand)]
        action: Option<MerchantsAction>,
    },

    /// Manage categories (list, add, rename, delete)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage subcategories
    Subcategories {
        #[command(subcommand)]
        action: SubcategoriesAction,
    },

    /// Show descriptions no merchant rule matches
    Unassigned {
        /// Maximum number of descriptions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Manage transactions (list, edit)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Classify every transaction that has no classification yet
    Reclassify,
}

#[derive(Subcommand)]
pub enum MappingsAction {
    /// List saved mappings
    List,

    /// Show one mapping's columns
    Show {
        /// Mapping name or id
        mapping: String,
    },

    /// Save a new mapping
    Add {
        /// Mapping name
        name: String,

        /// Fields in column order, comma-separated; leave a slot empty to skip
        /// a column (e.g. "date,,description,amount")
        #[arg(long)]
        columns: String,

        /// For a single Amount column: what a negative value means (debit or credit)
        #[arg(long)]
        negative_means: Option<String>,

        /// Account name stamped on imported transactions
        #[arg(short, long)]
        account: Option<String>,

        /// The files this mapping reads have no header row
        #[arg(long)]
        no_header: bool,
    },

    /// Delete a mapping
    Delete {
        /// Mapping name or id
        mapping: String,
    },
}

#[derive(Subcommand)]
pub enum MerchantsAction {
    /// List merchant rules
    List,

    /// Add a merchant rule and apply it to existing transactions
    Add {
        /// Merchant name
        name: String,

        /// Description substrings, comma-separated (defaults to the name)
        #[arg(short, long, value_delimiter = ',')]
        includes: Vec<String>,

        /// Category ID
        #[arg(short, long)]
        category: Option<i64>,

        /// Subcategory ID
        #[arg(short, long)]
        subcategory: Option<i64>,
    },

    /// Change a merchant rule and re-apply it
    Update {
        /// Merchant ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Replacement description substrings, comma-separated
        #[arg(short, long, value_delimiter = ',')]
        includes: Option<Vec<String>>,

        /// New category ID
        #[arg(short, long, conflicts_with = "clear_category")]
        category: Option<i64>,

        /// New subcategory ID
        #[arg(short, long, conflicts_with = "clear_category")]
        subcategory: Option<i64>,

        /// Remove the category and subcategory
        #[arg(long)]
        clear_category: bool,
    },

    /// Delete a merchant rule
    Delete {
        /// Merchant ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories with their subcategories
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Group: expense, income, transfer
        #[arg(short, long, default_value = "expense")]
        group: String,
    },

    /// Rename a category
    Rename {
        /// Category ID
        id: i64,

        /// New name
        name: String,
    },

    /// Delete a category and its subcategories
    Delete {
        /// Category ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum SubcategoriesAction {
    /// Add a subcategory
    Add {
        /// Parent category ID
        category: i64,

        /// Subcategory name
        name: String,
    },

    /// Delete a subcategory
    Delete {
        /// Subcategory ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Classify a transaction by hand
    Edit {
        /// Transaction ID
        id: i64,

        /// Merchant ID
        #[arg(long, conflicts_with = "clear_merchant")]
        merchant: Option<i64>,

        /// Category ID
        #[arg(long, conflicts_with = "clear_category")]
        category: Option<i64>,

        /// Subcategory ID
        #[arg(long, conflicts_with = "clear_subcategory")]
        subcategory: Option<i64>,

        /// Remove the merchant link
        #[arg(long)]
        clear_merchant: bool,

        /// Remove the category
        #[arg(long)]
        clear_category: bool,

        /// Remove the subcategory
        #[arg(long)]
        clear_subcategory: bool,
    },
}
