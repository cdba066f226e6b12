use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{duplex, split, AsyncWriteExt, DuplexStream, ReadHalf};
use tokio::sync::oneshot;
use tokio::time::timeout;

use tiny_ircbot::commands::builtin_registry;
use tiny_ircbot::reader::LineReader;
use tiny_ircbot::{Bot, CommandHandler, Config, Connection, Invocation, Outbox};

fn config() -> Arc<Config> {
    Arc::new(
        toml::from_str(
            r##"
            [server]
            host = "irc.example.com"

            [bot]
            nickname = "BotName"
            channels = ["#chan"]
            trusted_identity = "Pent"

            [limits]
            max_in_flight = 2
            outbound_queue = 4
            "##,
        )
        .unwrap(),
    )
}

const HANDSHAKE: [&str; 3] = ["USER BotName 8 * :BotName", "NICK BotName", "JOIN #chan"];

async fn read_all(reader: ReadHalf<DuplexStream>) -> Vec<String> {
    let mut reader = LineReader::new(reader);
    let mut lines = Vec::new();
    while let Some(line) = reader.next_line().await.unwrap() {
        lines.push(line);
    }
    lines
}

struct Boom;

#[async_trait]
impl CommandHandler for Boom {
    async fn handle(&self, _invocation: Invocation<'_>, _outbox: &Outbox) -> anyhow::Result<()> {
        panic!("handler bug");
    }
}

/// Never finishes.
struct Stuck;

#[async_trait]
impl CommandHandler for Stuck {
    async fn handle(&self, _invocation: Invocation<'_>, _outbox: &Outbox) -> anyhow::Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

#[tokio::test]
async fn test_session_until_server_hangs_up() {
    let (client, server) = duplex(64 * 1024);
    let (server_read, mut server_write) = split(server);
    let config = config();
    let registry = builtin_registry(&config);
    let bot = Bot::new(config, Connection::from_stream(client, 4), registry);

    let session = tokio::spawn(bot.run(std::future::pending()));

    server_write
        .write_all(
            b"PING :abc123\r\n\
              :Pent!pent@example.org JOIN #chan\r\n\
              :Mallory!m@example.org JOIN #chan\r\n\
              garbage with : colons\r\n\
              :\r\n\
              :nick!u@h PRIVMSG #chan :.version\r\n\
              :nick!u@h PRIVMSG #chan :hi BotName!\r\n\
              :nick!u@h PRIVMSG #chan :just talking\r\n",
        )
        .await
        .unwrap();
    server_write.shutdown().await.unwrap();

    let sent = read_all(server_read).await;
    session.await.unwrap().unwrap();

    assert_eq!(&sent[..3], &HANDSHAKE);

    let mut replies = sent[3..].to_vec();
    replies.sort();
    let mut expected = vec![
        "PONG abc123".to_string(),
        "MODE #chan +o Pent".to_string(),
        format!("PRIVMSG #chan :tiny-ircbot {}", env!("CARGO_PKG_VERSION")),
        "PRIVMSG #chan :Hi there nick".to_string(),
    ];
    expected.sort();
    assert_eq!(replies, expected);
}

#[tokio::test]
async fn test_panicking_handler_does_not_stop_routing() {
    let (client, server) = duplex(64 * 1024);
    let (server_read, mut server_write) = split(server);
    let config = config();
    let registry = builtin_registry(&config).register(".boom", Arc::new(Boom));
    let bot = Bot::new(config, Connection::from_stream(client, 4), registry);

    let session = tokio::spawn(bot.run(std::future::pending()));

    server_write
        .write_all(b":nick!u@h PRIVMSG #chan :.boom\r\nPING :after\r\n")
        .await
        .unwrap();
    server_write.shutdown().await.unwrap();

    let sent = read_all(server_read).await;
    session.await.unwrap().unwrap();

    assert_eq!(&sent[3..], &["PONG after"]);
}

#[tokio::test]
async fn test_shutdown_sends_quit() {
    let (client, server) = duplex(64 * 1024);
    let (server_read, _server_write) = split(server);
    let config = config();
    let registry = builtin_registry(&config);
    let bot = Bot::new(config, Connection::from_stream(client, 4), registry);
    let (stop, stopped) = oneshot::channel::<()>();

    let session = tokio::spawn(bot.run(async move {
        stopped.await.ok();
    }));
    stop.send(()).unwrap();

    let sent = read_all(server_read).await;
    session.await.unwrap().unwrap();

    assert_eq!(sent, ["USER BotName 8 * :BotName", "NICK BotName", "JOIN #chan", "QUIT :bye"]);
}

#[tokio::test]
async fn test_many_lines_with_small_limits() {
    let (client, server) = duplex(1024);
    let (server_read, mut server_write) = split(server);
    let config = config();
    let registry = builtin_registry(&config);
    let bot = Bot::new(config, Connection::from_stream(client, 4), registry);

    let session = tokio::spawn(bot.run(std::future::pending()));
    let collector = tokio::spawn(read_all(server_read));

    for i in 0..200 {
        server_write
            .write_all(format!("PING :{}\r\n", i).as_bytes())
            .await
            .unwrap();
    }
    server_write.shutdown().await.unwrap();

    session.await.unwrap().unwrap();
    let sent = collector.await.unwrap();

    let mut pongs: Vec<u32> = sent[3..]
        .iter()
        .map(|l| l.strip_prefix("PONG ").unwrap().parse().unwrap())
        .collect();
    pongs.sort_unstable();
    assert_eq!(pongs, (0..200).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_busy_handlers_do_not_block_ping_or_shutdown() {
    let (client, server) = duplex(64 * 1024);
    let (server_read, mut server_write) = split(server);
    let config = config();
    let registry = builtin_registry(&config).register(".stuck", Arc::new(Stuck));
    let bot = Bot::new(config, Connection::from_stream(client, 4), registry);
    let (stop, stopped) = oneshot::channel::<()>();

    let session = tokio::spawn(bot.run(async move {
        stopped.await.ok();
    }));

    // one more than max_in_flight
    let stuck = b":nick!u@h PRIVMSG #chan :.stuck\r\n".repeat(3);
    server_write.write_all(&stuck).await.unwrap();
    server_write.write_all(b"PING :alive\r\n").await.unwrap();

    let mut reader = LineReader::new(server_read);
    let mut seen = Vec::new();
    timeout(Duration::from_secs(3), async {
        while let Some(line) = reader.next_line().await.unwrap() {
            let done = line == "PONG alive";
            seen.push(line);
            if done {
                break;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(&seen[..3], &HANDSHAKE);
    assert_eq!(&seen[3..], &["PONG alive"]);

    stop.send(()).unwrap();
    timeout(Duration::from_secs(3), session)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let mut rest = Vec::new();
    while let Some(line) = reader.next_line().await.unwrap() {
        rest.push(line);
    }
    assert_eq!(rest, ["QUIT :bye"]);
}
