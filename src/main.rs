use anyhow::Result;
use bookshelf::api::{AdminResource, PageQuery};
use bookshelf::commands::{self, LoginMethod, parse_query_param};
use bookshelf::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// bookshelf - command-line client for the Bookshelf backend
///
/// Keeps a login session on disk and sends authenticated requests. An expired
/// access token is renewed once per request, transparently.
///
/// Examples:
///   bookshelf login -u reader -p secret
///   bookshelf request GET /api/user
///   bookshelf admin list users --size 20
///   bookshelf admin delete posts 12
#[derive(Parser, Debug)]
#[command(author, version = env!("BOOKSHELF_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (defaults to http://localhost:8080)
    #[arg(
        long = "api-url",
        env = "BOOKSHELF_API_URL",
        value_name = "URL",
        global = true
    )]
    pub api_url: Option<String>,

    /// Session file (defaults to <config dir>/bookshelf/session.json)
    #[arg(
        long = "session",
        env = "BOOKSHELF_SESSION",
        value_name = "PATH",
        global = true
    )]
    pub session: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Log in with a username and password, or from a social-auth redirect
    Login(LoginArgs),

    /// End the current session
    Logout,

    /// Delete the signed-in account
    DeleteAccount(DeleteAccountArgs),

    /// Show the signed-in user's profile
    Whoami,

    /// Show or replace your preferred hashtags
    Hashtags {
        #[command(subcommand)]
        action: Option<HashtagCommands>,
    },

    /// Send an authenticated request and print the response
    Request(RequestArgs),

    /// Back-office operations (administrators only)
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(clap::Args, Debug)]
#[command(group(
    clap::ArgGroup::new("method")
        .required(true)
        .args(["username", "callback_url"])
))]
pub struct LoginArgs {
    #[arg(long, short = 'u', requires = "password")]
    pub username: Option<String>,

    #[arg(long, short = 'p')]
    pub password: Option<String>,

    /// Redirect URL carrying accessToken and refreshToken query parameters
    #[arg(long = "callback-url", value_name = "URL", conflicts_with = "password")]
    pub callback_url: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteAccountArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, ...)
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Path relative to the API URL, e.g. /api/user
    #[arg(value_name = "PATH")]
    pub path: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,

    /// Query parameter, may be repeated
    #[arg(long, short = 'q', value_name = "KEY=VALUE", value_parser = parse_query_param)]
    pub query: Vec<(String, String)>,
}

#[derive(clap::Subcommand, Debug)]
enum HashtagCommands {
    /// Replace your preferred hashtags
    Set {
        #[arg(value_name = "TAG", required = true)]
        tags: Vec<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum AdminCommands {
    /// List one page of users, hashtags, contents or posts
    List(AdminListArgs),

    /// Change a user's account status
    SetStatus(SetStatusArgs),

    /// Delete a hashtag, content or post
    Delete(AdminDeleteArgs),

    /// Publish a notice post
    Notice(NoticeArgs),
}

#[derive(clap::Args, Debug)]
pub struct AdminListArgs {
    #[arg(value_name = "RESOURCE")]
    pub resource: AdminResource,

    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    #[arg(long, default_value_t = 10)]
    pub size: u32,

    #[arg(long = "sort-by", default_value = "createdAt")]
    pub sort_by: String,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetStatusArgs {
    #[arg(value_name = "USER_ID")]
    pub user_id: u64,

    /// New status, e.g. ACTIVE or BLOCKED
    #[arg(value_name = "STATUS")]
    pub status: String,
}

#[derive(clap::Args, Debug)]
pub struct AdminDeleteArgs {
    /// hashtags, contents or posts
    #[arg(value_name = "RESOURCE")]
    pub resource: AdminResource,

    #[arg(value_name = "ID")]
    pub id: u64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct NoticeArgs {
    #[arg(long, short = 't')]
    pub title: String,

    #[arg(long, short = 'b')]
    pub body: String,
}

impl LoginArgs {
    fn into_method(self) -> Result<LoginMethod> {
        match (self.username, self.password, self.callback_url) {
            (_, _, Some(url)) => Ok(LoginMethod::Callback { url }),
            (Some(username), Some(password), None) => {
                Ok(LoginMethod::Password { username, password })
            }
            _ => anyhow::bail!("Either --username/--password or --callback-url is required"),
        }
    }
}

impl From<AdminListArgs> for PageQuery {
    fn from(args: AdminListArgs) -> Self {
        PageQuery {
            page: args.page,
            size: args.size,
            sort_by: args.sort_by,
            asc: !args.desc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = bookshelf::runtime::RealRuntime;
    let config = Config::new(runtime, cli.api_url, cli.session)?;

    match cli.command {
        Commands::Login(args) => commands::login(&config, args.into_method()?).await?,
        Commands::Logout => commands::logout(&config).await?,
        Commands::DeleteAccount(args) => commands::delete_account(&config, args.yes).await?,
        Commands::Whoami => commands::whoami(&config).await?,
        Commands::Hashtags { action: None } => commands::hashtags(&config).await?,
        Commands::Hashtags {
            action: Some(HashtagCommands::Set { tags }),
        } => commands::set_hashtags(&config, &tags).await?,
        Commands::Request(args) => {
            commands::request(
                &config,
                &args.method,
                &args.path,
                args.data.as_deref(),
                &args.query,
            )
            .await?
        }
        Commands::Admin(AdminCommands::List(args)) => {
            let resource = args.resource;
            commands::admin_list(&config, resource, args.into()).await?
        }
        Commands::Admin(AdminCommands::SetStatus(args)) => {
            commands::admin_set_status(&config, args.user_id, &args.status).await?
        }
        Commands::Admin(AdminCommands::Delete(args)) => {
            commands::admin_delete(&config, args.resource, args.id, args.yes).await?
        }
        Commands::Admin(AdminCommands::Notice(args)) => {
            commands::admin_notice(&config, &args.title, &args.body).await?
        }
    }
    Ok(())
}
