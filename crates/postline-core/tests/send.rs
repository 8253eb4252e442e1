//! End-to-end delivery tests against a scripted relay.
//!
//! `MockStream` replays canned server replies and records everything the
//! client writes, so each test can check the exact command sequence.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use postline_core::{
    Attachment, ErrorKind, MailSender, OutgoingMessage, SendError, SenderConfig,
};

/// Mock stream for testing.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
    /// Set once the client shuts the stream down.
    closed: Arc<AtomicBool>,
}

/// Test-side view of what the client did with a [`MockStream`].
#[derive(Clone)]
struct Capture {
    sent: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Capture) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (stream, Capture { sent, closed })
    }
}

impl Capture {
    fn sent(&self) -> String {
        String::from_utf8(self.sent.lock().unwrap().clone()).unwrap()
    }

    fn commands(&self) -> Vec<String> {
        self.sent()
            .split("\r\n")
            .filter(|line| {
                ["EHLO ", "AUTH ", "MAIL FROM:", "RCPT TO:", "DATA", "QUIT"]
                    .iter()
                    .any(|prefix| line.starts_with(prefix))
            })
            .map(str::to_string)
            .collect()
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap();

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.closed.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

fn sender() -> MailSender {
    MailSender::new(
        SenderConfig::builder("relay.example.com", "me@example.com")
            .name("Me")
            .build()
            .unwrap(),
    )
}

fn authenticated_sender() -> MailSender {
    MailSender::new(
        SenderConfig::builder("relay.example.com", "me@example.com")
            .credentials("user", "pass")
            .build()
            .unwrap(),
    )
}

fn message() -> OutgoingMessage {
    OutgoingMessage::new("Hello", "<p>Hi there</p>")
}

#[tokio::test]
async fn test_successful_delivery_sends_one_quit_after_final_ack() {
    let (stream, capture) = MockStream::new(
        b"220 relay ready\r\n\
          250-relay.example.com Hello\r\n250-SIZE 1000\r\n250 HELP\r\n\
          250 sender ok\r\n\
          250 rcpt ok\r\n\
          250 rcpt ok\r\n\
          354 go ahead\r\n\
          250 queued as 12345\r\n",
    );

    sender()
        .deliver(stream, "a@x.com, b@y.com", &message())
        .await
        .unwrap();

    assert_eq!(
        capture.commands(),
        [
            "EHLO localhost",
            "MAIL FROM: <me@example.com>",
            "RCPT TO: <a@x.com>",
            "RCPT TO: <b@y.com>",
            "DATA",
            "QUIT",
        ]
    );

    let sent = capture.sent();
    assert_eq!(sent.matches("QUIT\r\n").count(), 1);
    assert!(sent.ends_with("--\r\n\r\n.\r\nQUIT\r\n"));
    assert!(capture.closed());
}

#[tokio::test]
async fn test_payload_follows_data() {
    let (stream, capture) = MockStream::new(
        b"220 ready\r\n250 hello\r\n250 ok\r\n250 ok\r\n354 go\r\n250 ok\r\n",
    );

    let message = message().attach(Attachment::new("notes.txt", "text/plain", "hello"));
    sender().deliver(stream, ["a@x.com"], &message).await.unwrap();

    let sent = capture.sent();
    let payload = &sent[sent.find("DATA\r\n").unwrap() + "DATA\r\n".len()..];
    assert!(payload.starts_with(
        "Subject: Hello\r\nTo: <a@x.com>\r\nFrom: <me@example.com>Me\r\nMIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=__NextPart_"
    ));
    assert!(payload.contains("\r\n\r\nThis is a multi-part message in MIME format.\r\n\r\n"));
    assert!(payload.contains("Content-Type: text/html; charset=\"utf8\"\r\n"));
    assert!(payload.contains("<p>Hi there</p>\r\n"));
    assert!(payload.contains("\tfilename=\"notes.txt\"\r\n\r\naGVsbG8=\r\n"));
}

#[tokio::test]
async fn test_recipients_are_sent_in_order() {
    let recipients = ["r1@x.com", "r2@x.com", "r3@x.com", "r4@x.com", "r5@x.com"];
    let mut script = String::from("220 ready\r\n250 hello\r\n250 ok\r\n");
    for _ in &recipients {
        script.push_str("250 ok\r\n");
    }
    script.push_str("354 go\r\n250 ok\r\n");

    let (stream, capture) = MockStream::new(script.as_bytes());
    sender().deliver(stream, recipients, &message()).await.unwrap();

    let rcpts: Vec<String> = capture
        .commands()
        .into_iter()
        .filter(|c| c.starts_with("RCPT TO:"))
        .collect();
    let expected: Vec<String> = recipients.iter().map(|r| format!("RCPT TO: <{r}>")).collect();
    assert_eq!(rcpts, expected);
}

#[tokio::test]
async fn test_refused_recipient_stops_before_data() {
    let (stream, capture) = MockStream::new(
        b"220 ready\r\n250 hello\r\n250 ok\r\n250 ok\r\n550 5.1.1 no such user\r\n",
    );

    let err = sender()
        .deliver(stream, "a@x.com, ghost@x.com, c@x.com", &message())
        .await
        .unwrap_err();

    match err {
        SendError::Protocol { code, ref message } => {
            assert_eq!(code, 550);
            assert_eq!(message, "5.1.1 no such user");
        }
        ref other => panic!("Expected protocol error, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Protocol);

    let commands = capture.commands();
    assert_eq!(commands.last().unwrap(), "RCPT TO: <ghost@x.com>");
    assert!(!commands.iter().any(|c| c == "DATA"));
    assert!(!commands.iter().any(|c| c == "QUIT"));
    assert!(capture.closed());
}

#[tokio::test]
async fn test_auth_login_then_envelope() {
    let (stream, capture) = MockStream::new(
        b"220 ready\r\n250-hello\r\n250 AUTH LOGIN\r\n\
          334 VXNlcm5hbWU6\r\n334 UGFzc3dvcmQ6\r\n235 ok\r\n\
          250 ok\r\n250 ok\r\n354 go\r\n250 ok\r\n",
    );

    authenticated_sender()
        .deliver(stream, "a@x.com", &message())
        .await
        .unwrap();

    let sent = capture.sent();
    assert!(sent.contains("AUTH LOGIN\r\ndXNlcg==\r\ncGFzcw==\r\nMAIL FROM: <me@example.com>\r\n"));
}

#[tokio::test]
async fn test_username_without_password_skips_auth() {
    let sender = MailSender::new(
        SenderConfig::builder("relay.example.com", "me@example.com")
            .credentials("user", "")
            .build()
            .unwrap(),
    );
    let (stream, capture) = MockStream::new(
        b"220 ready\r\n250 hello\r\n250 ok\r\n250 ok\r\n354 go\r\n250 ok\r\n",
    );

    sender.deliver(stream, "a@x.com", &message()).await.unwrap();

    assert!(!capture.sent().contains("AUTH"));
    assert_eq!(
        capture.commands(),
        [
            "EHLO localhost",
            "MAIL FROM: <me@example.com>",
            "RCPT TO: <a@x.com>",
            "DATA",
            "QUIT",
        ]
    );
}

#[tokio::test]
async fn test_rejected_password_sends_no_mail_from() {
    let (stream, capture) = MockStream::new(
        b"220 ready\r\n250 hello\r\n334 VXNlcm5hbWU6\r\n334 UGFzc3dvcmQ6\r\n\
          535 Authentication failed\r\n",
    );

    let err = authenticated_sender()
        .deliver(stream, "a@x.com", &message())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Protocol { code: 535, .. }));
    let sent = capture.sent();
    assert!(!sent.contains("MAIL FROM"));
    assert!(!sent.contains("QUIT"));
    assert!(capture.closed());
}

#[tokio::test]
async fn test_connection_dropped_mid_dialogue() {
    let (stream, capture) = MockStream::new(b"220 ready\r\n250 hello\r\n250 ok\r\n");

    let err = sender()
        .deliver(stream, "a@x.com", &message())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportRead);
    assert!(!capture.sent().contains("QUIT"));
    assert!(capture.closed());
}

#[tokio::test]
async fn test_invalid_input_never_touches_the_stream() {
    for recipients in ["", " , ", "a@x.com, not-an-address"] {
        let (stream, capture) = MockStream::new(b"220 ready\r\n");
        let err = sender()
            .deliver(stream, recipients, &message())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Composition);
        assert!(capture.sent().is_empty());
    }

    let (stream, capture) = MockStream::new(b"220 ready\r\n");
    let evil = OutgoingMessage::new("Hi\r\nBcc: victim@x.com", "body");
    let err = sender().deliver(stream, "a@x.com", &evil).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Composition);
    assert!(capture.sent().is_empty());
}

#[tokio::test]
async fn test_unreachable_relay_returns_false() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let sender = MailSender::new(
        SenderConfig::builder("127.0.0.1", "me@example.com")
            .port(port)
            .build()
            .unwrap(),
    );

    let err = sender.try_send("a@x.com", &message()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(!sender.send_mail("a@x.com", &message()).await);
}

#[tokio::test]
async fn test_send_mail_over_local_relay() {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let relay = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        let mut transcript = Vec::new();

        write.write_all(b"220 local relay\r\n").await.unwrap();
        let mut in_data = false;
        while let Some(line) = lines.next_line().await.unwrap() {
            transcript.push(line.clone());
            let reply: &[u8] = if in_data {
                if line != "." {
                    continue;
                }
                in_data = false;
                b"250 queued\r\n"
            } else if line == "DATA" {
                in_data = true;
                b"354 go ahead\r\n"
            } else if line == "QUIT" {
                break;
            } else {
                b"250 ok\r\n"
            };
            write.write_all(reply).await.unwrap();
        }
        transcript
    });

    let sender = MailSender::new(
        SenderConfig::builder("127.0.0.1", "me@example.com")
            .port(port)
            .build()
            .unwrap(),
    );
    assert!(sender.send_mail("a@x.com", &message()).await);

    let transcript = relay.await.unwrap();
    assert_eq!(transcript.first().unwrap(), "EHLO localhost");
    assert_eq!(transcript.last().unwrap(), "QUIT");
}
