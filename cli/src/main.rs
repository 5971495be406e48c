//! socialgraph-cli: command-line interface for the Social Graph Engine
//!
//! Talks to a running server over its JSON HTTP API.

mod client;

use clap::{Parser, Subcommand};
use client::{ClientResult, RemoteClient, ScoredUser};
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "socialgraph", version, about = "Social Graph Engine CLI")]
struct Cli {
    /// Server HTTP URL
    #[arg(long, default_value = "http://localhost:8080", global = true, env = "SOCIALGRAPH_URL")]
    url: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Make FOLLOWER follow FOLLOWEE
    Follow { follower: String, followee: String },
    /// Remove the follow FOLLOWER -> FOLLOWEE
    Unfollow { follower: String, followee: String },
    /// Relationship status between two users
    Relation { a: String, b: String },
    /// Shortest connection path
    Path {
        from: String,
        to: String,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Users both A and B follow
    Mutual {
        a: String,
        b: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// People USER may know
    Recommend {
        user: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Most-followed users
    Trending {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List known users
    Users {
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Network statistics of a user
    Stats {
        user: String,
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Users following USER
    Followers { user: String },
    /// Users USER follows
    Following { user: String },
    /// Users with a follow in both directions with USER
    Friends { user: String },
    /// Register a user without edges
    Register { user: String },
    /// Delete a user and all its follows
    RemoveUser { user: String },
    /// Get server status
    Status,
    /// Ping the server
    Ping,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = RemoteClient::new(&cli.url);

    if let Err(e) = run(&client, cli.command, cli.format).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(client: &RemoteClient, command: Commands, format: OutputFormat) -> ClientResult<()> {
    match command {
        Commands::Follow { follower, followee } => {
            let result = client.follow(&follower, &followee).await?;
            print_ack(&result, format, &format!("{} now follows {}", follower, followee))
        }
        Commands::Unfollow { follower, followee } => {
            let result = client.unfollow(&follower, &followee).await?;
            print_ack(&result, format, &format!("{} no longer follows {}", follower, followee))
        }
        Commands::Relation { a, b } => {
            let rel = client.relationship(&a, &b).await?;
            print_ack(&rel, format, &format!("{} -> {}: {}", rel.a, rel.b, rel.status))
        }
        Commands::Path { from, to, max_depth } => {
            let conn = client.path(&from, &to, max_depth).await?;
            let text = match conn.degrees {
                Some(d) => format!("{} ({} degree(s))", conn.path.join(" -> "), d),
                None => format!("No connection between {} and {}", conn.from, conn.to),
            };
            print_ack(&conn, format, &text)
        }
        Commands::Mutual { a, b, limit } => {
            let users = client.mutual(&a, &b, limit).await?;
            print_ids(&users, format, "Mutual")
        }
        Commands::Recommend { user, limit } => {
            let users = client.recommendations(&user, limit).await?;
            print_scored(&users, format, "Mutual friends")
        }
        Commands::Trending { limit } => {
            let users = client.trending(limit).await?;
            print_scored(&users, format, "Followers")
        }
        Commands::Users { skip, limit } => {
            let users = client.users(skip, limit).await?;
            print_ids(&users, format, "User")
        }
        Commands::Stats { user, depth } => {
            let stats = client.stats(&user, depth).await?;
            match format {
                OutputFormat::Json => print_json(&stats),
                OutputFormat::Table => {
                    let mut table = new_table(&["Metric", "Value"]);
                    table.add_row(vec!["following".to_string(), stats.following.to_string()]);
                    table.add_row(vec!["followers".to_string(), stats.followers.to_string()]);
                    table.add_row(vec!["second degree".to_string(), stats.second_degree.to_string()]);
                    for (hop, count) in stats.reach.iter().enumerate() {
                        table.add_row(vec![format!("reach @{}", hop + 1), count.to_string()]);
                    }
                    println!("{}", table);
                    Ok(())
                }
            }
        }
        Commands::Followers { user } => print_ids(&client.neighbors(&user, "followers").await?, format, "Follower"),
        Commands::Following { user } => print_ids(&client.neighbors(&user, "following").await?, format, "Following"),
        Commands::Friends { user } => print_ids(&client.neighbors(&user, "friends").await?, format, "Friend"),
        Commands::Register { user } => {
            let result = client.register_user(&user).await?;
            print_ack(&result, format, &format!("Registered {}", user))
        }
        Commands::RemoveUser { user } => {
            let result = client.remove_user(&user).await?;
            print_ack(&result, format, &format!("Removed {}", user))
        }
        Commands::Status => {
            let status = client.status().await?;
            match format {
                OutputFormat::Json => print_json(&status),
                OutputFormat::Table => {
                    println!("Status:        {}", status.status);
                    println!("Version:       {}", status.version);
                    println!("Users:         {}", status.graph.user_count);
                    println!("Follows:       {}", status.graph.edge_count);
                    println!("Mutual pairs:  {}", status.graph.mutual_pairs);
                    Ok(())
                }
            }
        }
        Commands::Ping => {
            println!("{}", client.ping().await?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ClientResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_ack<T: Serialize>(value: &T, format: OutputFormat, text: &str) -> ClientResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

fn print_ids(ids: &[String], format: OutputFormat, column: &str) -> ClientResult<()> {
    if let OutputFormat::Json = format {
        return print_json(&ids);
    }
    if ids.is_empty() {
        println!("(no results)");
        return Ok(());
    }

    let mut table = new_table(&["#", column]);
    for (i, id) in ids.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), id.clone()]);
    }
    println!("{}", table);
    println!("{} row(s)", ids.len());
    Ok(())
}

fn print_scored(users: &[ScoredUser], format: OutputFormat, score_column: &str) -> ClientResult<()> {
    if let OutputFormat::Json = format {
        return print_json(&users);
    }
    if users.is_empty() {
        println!("(no results)");
        return Ok(());
    }

    let with_source = users.iter().any(|u| u.source.is_some());
    let mut header = vec!["#", "User", score_column];
    if with_source {
        header.push("Source");
    }
    let mut table = new_table(&header);
    for (i, user) in users.iter().enumerate() {
        let mut row = vec![(i + 1).to_string(), user.id.clone(), user.score.to_string()];
        if with_source {
            row.push(user.source.clone().unwrap_or_default());
        }
        table.add_row(row);
    }
    println!("{}", table);
    println!("{} row(s)", users.len());
    Ok(())
}
