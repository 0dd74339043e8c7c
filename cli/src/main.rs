use std::path::PathBuf;

use chatkit::{ChannelEvent, ChatClient, FileStore};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] chatkit::ClientError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "chatkit", about = "Chat backend API and realtime CLI")]
struct Cli {
    #[arg(long, env = "CHATKIT_BASE_URL", default_value = chatkit::DEFAULT_BASE_URL)]
    base_url: String,

    /// Session file mirroring the token and user id across invocations.
    #[arg(long, env = "CHATKIT_SESSION_FILE", default_value = "chatkit-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and start a session.
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Authenticate and start a session.
    Login { email: String, password: String },
    /// Clear the stored session token.
    Logout,
    /// Show the authenticated user.
    Me,
    /// List other registered users.
    Users,
    Conversation(ConversationCommand),
    Message(MessageCommand),
    /// Tail a conversation's realtime channel.
    Watch { conversation_id: String },
}

#[derive(Args, Debug)]
struct ConversationCommand {
    #[command(subcommand)]
    command: ConversationSubcommand,
}

#[derive(Subcommand, Debug)]
enum ConversationSubcommand {
    List,
    Show {
        conversation_id: String,
    },
    Create {
        #[arg(long, default_value = "Untitled")]
        name: String,
        /// One-to-one conversation instead of a group.
        #[arg(long)]
        direct: bool,
        member_ids: Vec<String>,
    },
    AddMember {
        conversation_id: String,
        member_id: String,
    },
}

#[derive(Args, Debug)]
struct MessageCommand {
    #[command(subcommand)]
    command: MessageSubcommand,
}

#[derive(Subcommand, Debug)]
enum MessageSubcommand {
    List { conversation_id: String },
    Send { conversation_id: String, content: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = ChatClient::new(cli.base_url, FileStore::open(cli.session_file));

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let auth = client.register(&username, &email, &password).await?;
            print_json(&auth)
        }
        Command::Login { email, password } => {
            let auth = client.login(&email, &password).await?;
            print_json(&auth)
        }
        Command::Logout => {
            client.logout();
            eprintln!("session cleared");
            Ok(())
        }
        Command::Me => print_json(&client.current_user().await?),
        Command::Users => print_json(&client.users().await?),
        Command::Conversation(conversation) => run_conversation(&client, conversation).await,
        Command::Message(message) => run_message(&client, message).await,
        Command::Watch { conversation_id } => run_watch(&client, &conversation_id).await,
    }
}

async fn run_conversation(
    client: &ChatClient,
    conversation: ConversationCommand,
) -> Result<(), CliError> {
    match conversation.command {
        ConversationSubcommand::List => print_json(&client.conversations().await?),
        ConversationSubcommand::Show { conversation_id } => {
            print_json(&client.conversation(&conversation_id).await?)
        }
        ConversationSubcommand::Create {
            name,
            direct,
            member_ids,
        } => {
            let created = client
                .create_conversation(&name, !direct, &member_ids)
                .await?;
            print_json(&created)
        }
        ConversationSubcommand::AddMember {
            conversation_id,
            member_id,
        } => {
            client.add_member(&conversation_id, &member_id).await?;
            eprintln!("member added");
            Ok(())
        }
    }
}

async fn run_message(client: &ChatClient, message: MessageCommand) -> Result<(), CliError> {
    match message.command {
        MessageSubcommand::List { conversation_id } => {
            print_json(&client.messages(&conversation_id).await?)
        }
        MessageSubcommand::Send {
            conversation_id,
            content,
        } => print_json(&client.send_message(&conversation_id, &content).await?),
    }
}

async fn run_watch(client: &ChatClient, conversation_id: &str) -> Result<(), CliError> {
    let mut channel = client.connect(conversation_id).await?;
    while let Some(event) = channel.recv().await {
        match event {
            ChannelEvent::Message(message) => print_json(&message)?,
            ChannelEvent::PeerDisconnected { user_id } => {
                eprintln!("peer disconnected: {user_id}");
            }
            ChannelEvent::Error(detail) => eprintln!("channel error: {detail}"),
            ChannelEvent::Closed => {
                eprintln!("channel closed");
                break;
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
