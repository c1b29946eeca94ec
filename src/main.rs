use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wishledger::application::disputes::{OpenDispute, ResolveDispute};
use wishledger::application::engine::{Engine, RegisterUser};
use wishledger::application::wishes::CreateWish;
use wishledger::domain::ids::{DisputeId, FriendshipId, UserId, WishId};
use wishledger::error::EngineError;
use wishledger::interfaces::jsonl::op_reader::{Op, OpReader};
use wishledger::interfaces::jsonl::wallet_writer::WalletWriter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations file (JSON lines)
    input: PathBuf,

    /// Path to persistent database (optional). Requires the
    /// `storage-rocksdb` feature.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

/// Resolves the stream's handles and labels to engine ids.
///
/// Wish, dispute, and request labels only live for one run; user handles
/// also resolve against the store, so a persistent database keeps them
/// meaningful across runs.
#[derive(Default)]
struct Labels {
    users: HashMap<String, UserId>,
    order: Vec<String>,
    wishes: HashMap<String, WishId>,
    disputes: HashMap<String, DisputeId>,
    requests: HashMap<String, FriendshipId>,
}

impl Labels {
    async fn user(
        &mut self,
        engine: &Engine,
        handle: &str,
    ) -> std::result::Result<UserId, EngineError> {
        if let Some(id) = self.users.get(handle) {
            return Ok(*id);
        }
        let found = engine
            .search_users(handle)
            .await?
            .into_iter()
            .find(|user| user.handle == handle)
            .ok_or(EngineError::NotFound("user"))?;
        self.track_user(handle, found.id);
        Ok(found.id)
    }

    // Re-registering a handle re-points it at the new user without
    // duplicating its row in the final report
    fn track_user(&mut self, handle: &str, id: UserId) {
        if self.users.insert(handle.to_string(), id).is_none() {
            self.order.push(handle.to_string());
        }
    }

    fn wish(&self, label: &str) -> std::result::Result<WishId, EngineError> {
        self.wishes
            .get(label)
            .copied()
            .ok_or(EngineError::NotFound("wish"))
    }

    fn dispute(&self, label: &str) -> std::result::Result<DisputeId, EngineError> {
        self.disputes
            .get(label)
            .copied()
            .ok_or(EngineError::NotFound("dispute"))
    }

    fn request(&self, label: &str) -> std::result::Result<FriendshipId, EngineError> {
        self.requests
            .get(label)
            .copied()
            .ok_or(EngineError::NotFound("friend request"))
    }
}

async fn apply(
    engine: &Engine,
    labels: &mut Labels,
    op: Op,
) -> std::result::Result<(), EngineError> {
    match op {
        Op::RegisterUser { name, handle } => {
            let user = engine
                .register_user(RegisterUser {
                    name,
                    handle: handle.clone(),
                })
                .await?;
            labels.track_user(&handle, user.id);
        }
        Op::CreateWish {
            label,
            creator,
            title,
            description,
            currency,
        } => {
            let creator_id = labels.user(engine, &creator).await?;
            let wish = engine
                .create_wish(CreateWish {
                    creator_id,
                    title,
                    description,
                    currency,
                    deadline: None,
                })
                .await?;
            labels.wishes.insert(label, wish.id);
        }
        Op::AcceptWish { wish, actor } => {
            let actor_id = labels.user(engine, &actor).await?;
            engine.accept_wish(labels.wish(&wish)?, actor_id).await?;
        }
        Op::CompleteWish { wish, actor } => {
            let actor_id = labels.user(engine, &actor).await?;
            engine.complete_wish(labels.wish(&wish)?, actor_id).await?;
        }
        Op::OpenDispute {
            label,
            wish,
            disputer,
            comment,
            alternative_description,
        } => {
            let disputer_id = labels.user(engine, &disputer).await?;
            let dispute = engine
                .open_dispute(OpenDispute {
                    wish_id: labels.wish(&wish)?,
                    disputer_id,
                    comment,
                    alternative_description,
                })
                .await?;
            labels.disputes.insert(label, dispute.id);
        }
        Op::ResolveDispute {
            dispute,
            resolver,
            action,
            comment,
        } => {
            let resolver_id = labels.user(engine, &resolver).await?;
            engine
                .resolve_dispute(ResolveDispute {
                    dispute_id: labels.dispute(&dispute)?,
                    resolver_id,
                    action,
                    resolution_comment: comment,
                })
                .await?;
        }
        Op::Convert {
            user,
            from,
            to,
            amount,
        } => {
            let user_id = labels.user(engine, &user).await?;
            engine.convert(user_id, from, to, amount).await?;
        }
        Op::Gift {
            sender,
            receiver,
            currency,
            amount,
        } => {
            let sender_id = labels.user(engine, &sender).await?;
            let receiver_id = labels.user(engine, &receiver).await?;
            engine.gift(sender_id, receiver_id, currency, amount).await?;
        }
        Op::RequestFriend { label, from, to } => {
            let from_id = labels.user(engine, &from).await?;
            let to_id = labels.user(engine, &to).await?;
            let request = engine.request_friend(from_id, to_id).await?;
            labels.requests.insert(label, request.id);
        }
        Op::AcceptFriend { request, actor } => {
            let actor_id = labels.user(engine, &actor).await?;
            engine.accept_friend(labels.request(&request)?, actor_id).await?;
        }
        Op::RejectFriend { request, actor } => {
            let actor_id = labels.user(engine, &actor).await?;
            engine.reject_friend(labels.request(&request)?, actor_id).await?;
        }
        Op::Block { user, target } => {
            let user_id = labels.user(engine, &user).await?;
            let target_id = labels.user(engine, &target).await?;
            engine.block(user_id, target_id).await?;
        }
        Op::Unblock { user, target } => {
            let user_id = labels.user(engine, &user).await?;
            let target_id = labels.user(engine, &target).await?;
            engine.unblock(user_id, target_id).await?;
        }
    }
    Ok(())
}

fn build_engine(db_path: Option<PathBuf>) -> Result<Engine> {
    match db_path {
        None => Ok(Engine::in_memory()),
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                wishledger::infrastructure::rocksdb::RocksDbStore::open(path).into_diagnostic()?;
            Ok(Engine::new(
                Box::new(store.clone()),
                Box::new(store.clone()),
                Box::new(store.clone()),
                Box::new(store.clone()),
                Box::new(store),
            ))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => miette::bail!("--db-path requires the storage-rocksdb feature"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = build_engine(cli.db_path)?;

    let file = File::open(cli.input).into_diagnostic()?;
    let mut labels = Labels::default();
    for op_result in OpReader::new(file).ops() {
        match op_result {
            Ok(op) => {
                if let Err(e) = apply(&engine, &mut labels, op).await {
                    eprintln!("Error processing operation: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {e}");
            }
        }
    }

    // Final wallet state for every user this run touched
    let mut rows = Vec::new();
    for handle in &labels.order {
        let user_id = labels.users[handle];
        let balance = engine.balance(user_id).await.into_diagnostic()?;
        rows.push((handle.clone(), balance));
    }

    let stdout = io::stdout();
    let mut writer = WalletWriter::new(stdout.lock());
    writer.write_wallets(rows).into_diagnostic()?;

    Ok(())
}
