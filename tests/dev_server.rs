// tests/dev_server.rs

use std::error::Error;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use assetflow::server::assets::inject_script;
use assetflow::server::reload::RELOAD_SCRIPT;
use assetflow::server::{DevServer, Reloader, ServerOptions, RELOAD_PATH};
use assetflow_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn options(inject: bool) -> ServerOptions {
    ServerOptions {
        host: "127.0.0.1".to_string(),
        port: 0,
        inject_reload_script: inject,
    }
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("index.html"), "<html><body><p>hi</p></body></html>").unwrap();
    std::fs::create_dir_all(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/style.css"), "p{color:red}").unwrap();
    dir
}

async fn get(addr: SocketAddr, path: &str) -> Result<String, Box<dyn Error>> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

#[tokio::test]
async fn html_pages_get_the_reload_client() -> TestResult {
    init_tracing();
    let dir = site();
    let server = DevServer::start(dir.path(), options(true)).await?;

    let response = with_timeout(get(server.addr(), "/index.html")).await?;

    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains(&format!("<p>hi</p>{RELOAD_SCRIPT}</body>")));

    let root = with_timeout(get(server.addr(), "/")).await?;
    assert!(root.contains(RELOAD_PATH), "directory index is html too");

    server.shutdown();
    Ok(())
}

#[tokio::test]
async fn other_files_are_served_verbatim() -> TestResult {
    init_tracing();
    let dir = site();
    let server = DevServer::start(dir.path(), options(true)).await?;

    let css = with_timeout(get(server.addr(), "/css/style.css")).await?;
    assert!(css.starts_with("HTTP/1.1 200"));
    assert!(css.ends_with("p{color:red}"));

    let missing = with_timeout(get(server.addr(), "/nope.html")).await?;
    assert!(missing.starts_with("HTTP/1.1 404"), "got: {missing}");

    server.shutdown();
    Ok(())
}

#[tokio::test]
async fn injection_can_be_disabled() -> TestResult {
    let dir = site();
    let server = DevServer::start(dir.path(), options(false)).await?;

    let response = with_timeout(get(server.addr(), "/index.html")).await?;
    assert!(!response.contains(RELOAD_PATH));

    server.shutdown();
    Ok(())
}

#[tokio::test]
async fn reload_reaches_connected_clients() -> TestResult {
    init_tracing();
    let dir = site();
    let server = DevServer::start(dir.path(), options(true)).await?;

    // Nobody is listening yet; must not fail.
    server.reload();

    let mut stream = TcpStream::connect(server.addr()).await?;
    let handshake = format!(
        "GET {RELOAD_PATH} HTTP/1.1\r\nHost: {}\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n",
        server.addr()
    );
    stream.write_all(handshake.as_bytes()).await?;

    let mut head = Vec::new();
    with_timeout(async {
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            stream.read_exact(&mut byte).await?;
            head.push(byte[0]);
        }
        Ok::<_, std::io::Error>(())
    })
    .await?;
    let head = String::from_utf8_lossy(&head);
    assert!(head.starts_with("HTTP/1.1 101"), "got: {head}");

    server.reload();

    // Unmasked text frame carrying "reload".
    let mut frame = [0u8; 8];
    with_timeout(stream.read_exact(&mut frame)).await?;
    assert_eq!(frame[0], 0x81);
    assert_eq!(frame[1], 6);
    assert_eq!(&frame[2..], b"reload");

    server.shutdown();
    Ok(())
}

#[test]
fn script_goes_before_the_last_body_tag() {
    let html = "<body><pre></body></pre></body>";
    assert_eq!(
        inject_script(html),
        format!("<body><pre></body></pre>{RELOAD_SCRIPT}</body>")
    );
    assert_eq!(inject_script("<p>frag</p>"), format!("<p>frag</p>{RELOAD_SCRIPT}"));
}
