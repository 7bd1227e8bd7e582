//! 主应用程序入口
//!
//! 以控制台方式运行聊天核心：加载配置、初始化日志、装配内存适配器，
//! 然后以一个免费学生的身份收发消息。

use std::sync::Arc;

use application::{
    ApplicationError, ChannelEvent, ChatFeed, ChatService, ChatServiceDependencies, Clock, SearchDefaults,
    SendMessageRequest, SendStampStore, SyllabusSearchDependencies, SyllabusSearchService,
    SystemClock, UserStore,
};
use config::AppConfig;
use domain::{
    AcademicProfile, Channel, Chapter, ChatAccessPolicy, Message, User, UserId, UserRole,
};
use infrastructure::{
    InMemoryChapterSource, InMemoryMessageStore, InMemorySendStampStore, InMemoryUserStore,
    JsonFileSendStampStore, StaticSubjectCatalog,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const HELP: &str = "commands: /skip <text>  /support  /public  /search <term>  /credits  /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG 优先于配置文件
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.filter)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        cooldown_seconds = config.chat.cooldown_seconds,
        message_cost = config.chat.message_cost,
        skip_cost = config.chat.skip_cost,
        "启动 edu-chat"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let send_stamps: Arc<dyn SendStampStore> = match &config.storage.send_stamp_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "发送时间写入文件");
            Arc::new(JsonFileSendStampStore::new(path))
        }
        None => Arc::new(InMemorySendStampStore::new()),
    };

    let student = User::student(UserId::from(Uuid::new_v4()), "Aarav")
        .with_credits(3)
        .with_profile(AcademicProfile {
            class_level: Some("11".into()),
            board: None,
            stream: Some("Science".into()),
        });
    let admin = User::staff(UserId::from(Uuid::new_v4()), "Team Lead", UserRole::Admin);
    let user_store = Arc::new(InMemoryUserStore::with_users([student.clone(), admin.clone()]));
    let message_store = Arc::new(InMemoryMessageStore::new(config.chat.broadcast_capacity));

    let chat = ChatService::new(ChatServiceDependencies {
        message_store,
        user_store: user_store.clone(),
        send_stamps,
        clock: clock.clone(),
        policy: ChatAccessPolicy::new(config.chat.channel_settings()),
        history_limit: config.chat.history_limit,
    });

    let search = SyllabusSearchService::new(SyllabusSearchDependencies {
        catalog: Arc::new(StaticSubjectCatalog),
        chapters: Arc::new(demo_chapters()?),
        clock,
        defaults: SearchDefaults {
            board: config.search.default_board.clone(),
            stream: config.search.default_stream.clone(),
            language: config.search.language.clone(),
            supported_classes: config.search.supported_classes.clone(),
        },
    });

    chat.send_message(SendMessageRequest {
        sender_id: admin.id,
        channel: Channel::Public,
        text: "Welcome to the community chat! Be kind and stay on topic.".into(),
        accept_skip: false,
    })
    .await?;

    let mut channel = Channel::Public;
    let mut subscription = chat.subscribe(student.id, channel, None).await?;
    let mut feed = ChatFeed::with_capacity(config.chat.history_limit);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = subscription.next_event(), if subscription.is_active() => match event {
                Some(event) => render(&mut feed, event),
                None => tracing::warn!(channel = %channel, "订阅已结束"),
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                match line.split_once(' ').unwrap_or((line, "")) {
                    ("/quit", _) => break,
                    ("/help", _) => println!("{HELP}"),
                    ("/credits", _) => {
                        if let Some(user) = user_store.find_by_id(student.id).await? {
                            println!("credits: {}", user.credits);
                        }
                    }
                    ("/support", _) | ("/public", _) => {
                        channel = if line == "/support" {
                            Channel::support_for(student.id)
                        } else {
                            Channel::Public
                        };
                        subscription.unsubscribe();
                        subscription = chat.subscribe(student.id, channel, None).await?;
                        feed = ChatFeed::with_capacity(config.chat.history_limit);
                        println!("-- now in {channel}");
                    }
                    ("/search", term) => match search.search(&student, term).await {
                        Ok(outcome) => {
                            for lesson in &outcome.results {
                                println!("  [{}] {} ({})", lesson.id, lesson.title, lesson.subtitle);
                            }
                            println!("{}", outcome.status);
                        }
                        Err(_) => println!("Search failed. Try again."),
                    },
                    ("/skip", text) => send(&chat, student.id, channel, text, true).await,
                    _ if line.is_empty() => {}
                    _ => send(&chat, student.id, channel, line, false).await,
                }
            }
        }
    }

    subscription.unsubscribe();
    tracing::info!("退出 edu-chat");
    Ok(())
}

async fn send(chat: &ChatService, sender_id: UserId, channel: Channel, text: &str, accept_skip: bool) {
    let request = SendMessageRequest {
        sender_id,
        channel,
        text: text.to_owned(),
        accept_skip,
    };
    match chat.send_message(request).await {
        Ok(receipt) => {
            if !receipt.charge.is_free() {
                println!(
                    "-- charged {} credit(s), {} left",
                    receipt.charge.total(),
                    receipt.credits_remaining
                );
            }
            if let Some(seconds) = receipt.cooldown_reset {
                println!("-- next public message in {seconds}s");
            }
        }
        Err(ApplicationError::CooldownActive {
            remaining_seconds,
            offer_skip,
        }) => {
            if offer_skip {
                let cost = chat.policy().settings().skip_cost;
                println!(
                    "-- wait {remaining_seconds}s, or skip for {cost} credit(s): /skip <text>"
                );
            } else {
                println!("-- wait {remaining_seconds}s");
            }
        }
        Err(err) if err.is_user_facing() => println!("-- {err}"),
        Err(err) => {
            tracing::warn!(error = %err, "发送失败");
            println!("-- failed to send, try again");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redraw {
    Unchanged,
    /// 新消息排在末尾，只打印这一条
    Tail,
    /// 晚到的旧消息或删除，整屏重绘
    Full,
}

/// 把事件折叠进消息列表，返回需要的重绘方式
fn fold_event(feed: &mut ChatFeed, event: ChannelEvent) -> Redraw {
    let appended = match &event {
        ChannelEvent::Appended(message) => Some(message.id),
        ChannelEvent::Removed { .. } => None,
    };
    if !feed.apply(event) {
        return Redraw::Unchanged;
    }
    match (appended, feed.messages().last()) {
        (Some(id), Some(last)) if last.id == id => Redraw::Tail,
        _ => Redraw::Full,
    }
}

fn render(feed: &mut ChatFeed, event: ChannelEvent) {
    match fold_event(feed, event) {
        Redraw::Unchanged => {}
        Redraw::Tail => {
            if let Some(last) = feed.messages().last() {
                print_message(last);
            }
        }
        Redraw::Full => {
            println!("-- redrawing");
            for message in feed.messages() {
                print_message(message);
            }
        }
    }
}

fn print_message(message: &Message) {
    let badge = message
        .badge()
        .map(|badge| format!(" {badge:?}"))
        .unwrap_or_default();
    println!(
        "[{}] {}{} ({:?}): {}",
        message.created_at.format("%H:%M:%S"),
        message.sender_name,
        badge,
        message.bubble_tier(),
        message.text
    );
}

fn demo_chapters() -> Result<InMemoryChapterSource, domain::RepositoryError> {
    let chapter = |id: &str, title: &str, description: &str| Chapter {
        id: id.into(),
        title: title.into(),
        description: Some(description.into()),
    };
    InMemoryChapterSource::new()
        .with_chapters(
            "11",
            "physics",
            vec![
                chapter("ph11-1", "Units and Measurement", "SI units, errors"),
                chapter("ph11-2", "Laws of Motion", "Newton's laws, friction"),
                chapter("ph11-3", "Thermodynamics", "Heat, work and entropy"),
            ],
        )?
        .with_chapters(
            "11",
            "chemistry",
            vec![
                chapter("ch11-1", "Structure of Atom", "Bohr model, quantum numbers"),
                chapter("ch11-2", "Chemical Thermodynamics", "Enthalpy and Gibbs energy"),
            ],
        )?
        .with_chapters(
            "11",
            "mathematics",
            vec![chapter("ma11-1", "Sets", "Venn diagrams, operations on sets")],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use domain::{MessageContent, MessageId, NewMessage};

    fn appended(text: &str, offset: i64) -> ChannelEvent {
        let user = User::student(UserId::from(Uuid::new_v4()), "isha");
        let draft = NewMessage::compose(
            &user,
            Channel::Public,
            MessageContent::new(text).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(offset),
        );
        ChannelEvent::Appended(draft.into_message(MessageId::from(Uuid::new_v4())))
    }

    #[test]
    fn late_arrivals_trigger_a_full_redraw_in_order() {
        let mut feed = ChatFeed::new();
        assert_eq!(fold_event(&mut feed, appended("b", 2)), Redraw::Tail);
        assert_eq!(fold_event(&mut feed, appended("c", 3)), Redraw::Tail);
        assert_eq!(fold_event(&mut feed, appended("a", 1)), Redraw::Full);

        let texts: Vec<_> = feed.messages().iter().map(|m| m.text.to_string()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicates_and_removals() {
        let mut feed = ChatFeed::new();
        let event = appended("a", 1);
        let id = match &event {
            ChannelEvent::Appended(message) => message.id,
            ChannelEvent::Removed { .. } => unreachable!(),
        };
        assert_eq!(fold_event(&mut feed, event.clone()), Redraw::Tail);
        assert_eq!(fold_event(&mut feed, event), Redraw::Unchanged);
        assert_eq!(
            fold_event(
                &mut feed,
                ChannelEvent::Removed {
                    channel: Channel::Public,
                    id
                }
            ),
            Redraw::Full
        );
        assert!(feed.is_empty());
    }
}
