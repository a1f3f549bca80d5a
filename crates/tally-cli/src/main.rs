//! Tally CLI - Statement import and merchant rules
//!
//! Usage:
//!   tally init                                  Create the database and seed defaults
//!   tally import --file CSV --mapping NAME      Import a statement
//!   tally merchants add NAME --includes A,B     Add a merchant rule
//!   tally unassigned                            Descriptions no rule matches

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tally_core::models::ClassificationUpdate;
use tally_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::{MerchantEdit, Session};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(user) = cli.user {
        config.user_id = user;
    }

    let session = Session::open(&config, cli.json)?;

    match cli.command {
        Commands::Init => commands::cmd_init(&config, &session),
        Commands::Import {
            file,
            mapping,
            account,
            header,
            no_header,
        } => {
            let includes_header = match (header, no_header) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::cmd_import(&session, &file, &mapping, account, includes_header)
        }
        Commands::Mappings { action } => match action {
            None | Some(MappingsAction::List) => commands::cmd_mappings_list(&session),
            Some(MappingsAction::Show { mapping }) => {
                commands::cmd_mappings_show(&session, &mapping)
            }
            Some(MappingsAction::Add {
                name,
                columns,
                negative_means,
                account,
                no_header,
            }) => commands::cmd_mappings_add(
                &session,
                &name,
                &columns,
                negative_means.as_deref(),
                account.as_deref(),
                no_header,
            ),
            Some(MappingsAction::Delete { mapping }) => {
                commands::cmd_mappings_delete(&session, &mapping)
            }
        },
        Commands::Merchants { action } => match action {
            None | Some(MerchantsAction::List) => commands::cmd_merchants_list(&session),
            Some(MerchantsAction::Add {
                name,
                includes,
                category,
                subcategory,
            }) => commands::cmd_merchants_add(&session, &name, includes, category, subcategory),
            Some(MerchantsAction::Update {
                id,
                name,
                includes,
                category,
                subcategory,
                clear_category,
            }) => commands::cmd_merchants_update(
                &session,
                id,
                MerchantEdit {
                    name,
                    includes,
                    category_id: category,
                    subcategory_id: subcategory,
                    clear_category,
                },
            ),
            Some(MerchantsAction::Delete { id }) => commands::cmd_merchants_delete(&session, id),
        },
        Commands::Categories { action } => match action {
            None | Some(CategoriesAction::List) => commands::cmd_categories_list(&session),
            Some(CategoriesAction::Add { name, group }) => {
                commands::cmd_categories_add(&session, &name, &group)
            }
            Some(CategoriesAction::Rename { id, name }) => {
                commands::cmd_categories_rename(&session, id, &name)
            }
            Some(CategoriesAction::Delete { id }) => commands::cmd_categories_delete(&session, id),
        },
        Commands::Subcategories { action } => match action {
            SubcategoriesAction::Add { category, name } => {
                commands::cmd_subcategories_add(&session, category, &name)
            }
            SubcategoriesAction::Delete { id } => commands::cmd_subcategories_delete(&session, id),
        },
        Commands::Unassigned { limit } => commands::cmd_unassigned(&session, limit),
        Commands::Transactions { action } => match action {
            None => commands::cmd_transactions_list(&session, 20),
            Some(TransactionsAction::List { limit }) => {
                commands::cmd_transactions_list(&session, limit)
            }
            Some(TransactionsAction::Edit {
                id,
                merchant,
                category,
                subcategory,
                clear_merchant,
                clear_category,
                clear_subcategory,
            }) => {
                let update = ClassificationUpdate {
                    merchant_id: commands::slot(merchant, clear_merchant),
                    category_id: commands::slot(category, clear_category),
                    subcategory_id: commands::slot(subcategory, clear_subcategory),
                };
                commands::cmd_transactions_edit(&session, id, update)
            }
        },
        Commands::Reclassify => commands::cmd_reclassify(&session),
    }
}
