//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fooddeals_core::api::FoodDealsApi;
use fooddeals_core::{config, logging};
use fooddeals_types::SortMode;

mod commands;

#[derive(Parser)]
#[command(name = "fooddeals")]
#[command(version = "0.1")]
#[command(about = "Share and discover food deals from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Email and password shared by `register` and `login`.
#[derive(clap::Args, Debug, Clone)]
struct Credentials {
    /// Account email
    #[arg(long, env = "FOODDEALS_EMAIL")]
    email: String,

    /// Account password
    #[arg(long, env = "FOODDEALS_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Sign in with email and password
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Exchange the refresh cookie for a new access token
    Refresh,

    /// Password recovery
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },
    /// Browse and manage posts
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },
    /// Read and write comments
    Comments {
        #[command(subcommand)]
        command: CommentCommands,
    },
    /// Manage the account
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
    /// Classify food images
    Vision {
        #[command(subcommand)]
        command: VisionCommands,
    },
    /// Upload a file and print its public URL
    Upload {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum PasswordCommands {
    /// Email a password reset link
    Forgot {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using a reset token
    Reset {
        #[arg(long)]
        token: String,
        #[arg(long = "new-password")]
        new_password: String,
    },
}

#[derive(clap::Subcommand)]
enum PostCommands {
    /// List posts
    List {
        /// Sort order: new, old or likes
        #[arg(long, default_value_t = SortMode::Newest)]
        sort: SortMode,
        /// Only show posts whose body contains this text
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Publish a post
    Create {
        #[arg(long)]
        body: String,
        /// Image to upload and attach
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Like a post
    Like {
        #[arg(value_name = "POST_ID")]
        id: i64,
    },
    /// Delete one of your posts
    Delete {
        #[arg(value_name = "POST_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum CommentCommands {
    /// Show a post and its comments
    List {
        #[arg(value_name = "POST_ID")]
        post_id: i64,
    },
    /// Comment on a post
    Add {
        #[arg(value_name = "POST_ID")]
        post_id: i64,
        #[arg(long)]
        body: String,
    },
}

#[derive(clap::Subcommand)]
enum AccountCommands {
    /// Permanently delete the signed-in account
    Delete,
}

#[derive(clap::Subcommand)]
enum VisionCommands {
    /// Classify one image
    Predict {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Classify several images in one request
    Batch {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Classify every image inside a zip archive
    Zip {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Config commands must work even when the config file is broken.
    let command = match cli.command {
        Commands::Config { command } => return config_command(command),
        command => command,
    };

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init().context("init logging")?;
    let api = FoodDealsApi::open(config).context("open session")?;

    match command {
        Commands::Register { credentials } => {
            commands::auth::register(&api, &credentials.email, &credentials.password).await
        }
        Commands::Login { credentials } => {
            commands::auth::login(&api, &credentials.email, &credentials.password).await
        }
        Commands::Logout => commands::auth::logout(&api),
        Commands::Whoami => commands::auth::whoami(&api).await,
        Commands::Refresh => commands::auth::refresh(&api).await,

        Commands::Password { command } => match command {
            PasswordCommands::Forgot { email } => commands::auth::forgot_password(&api, &email).await,
            PasswordCommands::Reset {
                token,
                new_password,
            } => commands::auth::reset_password(&api, &token, &new_password).await,
        },

        Commands::Posts { command } => match command {
            PostCommands::List { sort, search } => commands::posts::list(&api, sort, &search).await,
            PostCommands::Create { body, image } => {
                commands::posts::create(&api, &body, image.as_deref()).await
            }
            PostCommands::Like { id } => commands::posts::like(&api, id).await,
            PostCommands::Delete { id } => commands::posts::delete(&api, id).await,
        },

        Commands::Comments { command } => match command {
            CommentCommands::List { post_id } => commands::comments::list(&api, post_id).await,
            CommentCommands::Add { post_id, body } => {
                commands::comments::add(&api, post_id, &body).await
            }
        },

        Commands::Account { command } => match command {
            AccountCommands::Delete => commands::auth::delete_account(&api).await,
        },

        Commands::Vision { command } => match command {
            VisionCommands::Predict { path } => commands::media::predict(&api, &path).await,
            VisionCommands::Batch { paths } => commands::media::batch(&api, &paths).await,
            VisionCommands::Zip { path } => commands::media::zip(&api, &path).await,
        },

        Commands::Upload { path } => commands::media::upload(&api, &path).await,

        Commands::Config { command } => config_command(command),
    }
}

fn config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            commands::config::path();
            Ok(())
        }
        ConfigCommands::Init => commands::config::init(),
    }
}
