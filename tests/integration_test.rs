use bulk_sender::browser::open_session_page;
use bulk_sender::config::Config;
use bulk_sender::infrastructure::JsExecutor;
use bulk_sender::{logger, HandshakeEvent, MessagingChannel, WhatsAppWebChannel};

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_session_page() {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env().expect("配置无效");

    // 测试打开 WhatsApp Web
    let result = open_session_page(&config).await;

    assert!(result.is_ok(), "应该能够打开 WhatsApp Web 页面");
}

#[tokio::test]
#[ignore]
async fn test_whatsapp_handshake_and_send() {
    logger::init();

    let config = Config::from_env().expect("配置无效");
    // 注意：请通过环境变量 TEST_PHONE 指定接收测试消息的号码（不含区号）
    let phone = std::env::var("TEST_PHONE").expect("需要设置 TEST_PHONE");

    let (_browser, page) = open_session_page(&config)
        .await
        .expect("打开浏览器失败");
    let channel = WhatsAppWebChannel::new(JsExecutor::new(page), &config);

    loop {
        match channel.next_handshake_event().await.expect("握手失败") {
            HandshakeEvent::Challenge(data) => println!("QR: {}", data),
            HandshakeEvent::Ready => break,
        }
    }

    let recipient = channel.recipient_id(&phone);
    channel
        .send(&recipient, "Mensagem de teste")
        .await
        .expect("发送失败");
}
