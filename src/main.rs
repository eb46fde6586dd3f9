use std::path::PathBuf;

use clap::{Parser, Subcommand};
use prosedur_asistan::Result;
use prosedur_asistan::commands::{
    ask_question, clear_documents, delete_document, faq_analytics, generate_faq, list_documents,
    list_faq, reindex, search_chunks, show_history, show_status, similar_questions,
    suggest_questions, upload_document,
};
use prosedur_asistan::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "prosedur-asistan")]
#[command(about = "Turkish corporate-document question answering assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Upload a document and make it searchable
    Upload {
        /// Path of the document file
        file: PathBuf,
    },
    /// List all uploaded documents
    List,
    /// Delete a document by ID
    Delete {
        /// Document ID to delete
        document: String,
    },
    /// Delete all documents and clear the index
    Clear {
        /// Actually perform the deletion
        #[arg(long)]
        confirm: bool,
    },
    /// Rebuild the vector index from the stored corpus
    Reindex,
    /// Ask a question against the indexed documents
    Ask {
        /// The question, in Turkish
        question: String,
        /// Continue an existing conversation
        #[arg(long)]
        session: Option<String>,
    },
    /// Show the raw chunks retrieved for a question
    Search {
        /// The search query
        question: String,
    },
    /// Find similar past questions in the chat history
    Similar {
        /// The question to compare against history
        question: String,
    },
    /// Suggest questions for a partially typed query
    Suggest {
        /// The partial query (min 3 characters)
        query: String,
    },
    /// Show the exchanges of one conversation
    History {
        /// Session ID printed by 'ask'
        session: String,
    },
    /// FAQ mining over the chat history
    Faq {
        #[command(subcommand)]
        command: FaqCommands,
    },
    /// Show pipeline health and corpus statistics
    Status,
}

#[derive(Subcommand)]
enum FaqCommands {
    /// Mine the chat history and upsert the FAQ list
    Generate {
        /// Minimum times a question must have been asked
        #[arg(long, default_value_t = 2)]
        min_frequency: usize,
        /// Maximum number of FAQ entries to produce
        #[arg(long, default_value_t = 50)]
        max_items: usize,
    },
    /// List active FAQ entries
    List {
        /// Only show entries in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Show mining statistics
    Analytics,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Upload { file } => {
            upload_document(&file).await?;
        }
        Commands::List => {
            list_documents().await?;
        }
        Commands::Delete { document } => {
            delete_document(&document).await?;
        }
        Commands::Clear { confirm } => {
            clear_documents(confirm).await?;
        }
        Commands::Reindex => {
            reindex().await?;
        }
        Commands::Ask { question, session } => {
            ask_question(&question, session).await?;
        }
        Commands::Search { question } => {
            search_chunks(&question).await?;
        }
        Commands::Similar { question } => {
            similar_questions(&question).await?;
        }
        Commands::Suggest { query } => {
            suggest_questions(&query).await?;
        }
        Commands::History { session } => {
            show_history(&session).await?;
        }
        Commands::Faq { command } => match command {
            FaqCommands::Generate {
                min_frequency,
                max_items,
            } => {
                generate_faq(min_frequency, max_items).await?;
            }
            FaqCommands::List { category } => {
                list_faq(category).await?;
            }
            FaqCommands::Analytics => {
                faq_analytics().await?;
            }
        },
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
