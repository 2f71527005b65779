use domain::{ProcessState, RawDeviceReading};
use plc_protocol::{
    BlockImage, DeviceReader, ImagePublisher, ModbusDeviceClient, ProtocolError, RegisterImage,
    run_image_refresher, serve_block, serve_registers,
};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

fn running_state() -> ProcessState {
    ProcessState {
        running: true,
        speed: 50,
        temperature_tenths_c: 161,
        pressure_kpa: 3244,
    }
}

#[tokio::test]
async fn device_client_reads_register_server() {
    let publisher = ImagePublisher::<RegisterImage>::new(&running_state());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let server = tokio::spawn(serve_registers(listener, publisher.reader()));

    let reading = ModbusDeviceClient::new()
        .read("127.0.0.1", port, Duration::from_secs(2))
        .await
        .expect("read");
    assert_eq!(
        reading,
        RawDeviceReading {
            run: true,
            speed: 50,
            temperature_tenths_c: 161,
            pressure_kpa: 3244,
        }
    );

    // 刷新后新连接读到新映像
    let mut next = running_state();
    next.running = false;
    next.pressure_kpa = 3100;
    publisher.refresh(&next);
    let reading = ModbusDeviceClient::new()
        .read("127.0.0.1", port, Duration::from_secs(2))
        .await
        .expect("read");
    assert!(!reading.run);
    assert_eq!(reading.pressure_kpa, 3100);

    server.abort();
}

#[tokio::test]
async fn refused_connection_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let err = ModbusDeviceClient::new()
        .read("127.0.0.1", port, Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Connect(_)), "{err}");
}

#[tokio::test]
async fn silent_device_times_out_as_protocol_error() {
    // 监听但从不应答
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let started = Instant::now();
    let err = ModbusDeviceClient::new()
        .read("127.0.0.1", port, Duration::from_millis(300))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Protocol(_)), "{err}");
    assert!(started.elapsed() < Duration::from_secs(2));
    drop(listener);
}

async fn exchange(stream: &mut TcpStream, frame: &[u8]) -> Vec<u8> {
    stream.write_all(frame).await.expect("write");
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.expect("header");
    let total = u16::from_be_bytes([header[2], header[3]]) as usize;
    let mut body = vec![0u8; total - 4];
    stream.read_exact(&mut body).await.expect("body");
    body
}

fn tpkt(body: &[u8]) -> Vec<u8> {
    let total = (body.len() + 4) as u16;
    let mut out = vec![0x03, 0x00];
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn s7_job(pdu_ref: u16, params: &[u8]) -> Vec<u8> {
    let mut body = vec![0x02, 0xF0, 0x80, 0x32, 0x01, 0x00, 0x00];
    body.extend_from_slice(&pdu_ref.to_be_bytes());
    body.extend_from_slice(&(params.len() as u16).to_be_bytes());
    body.extend_from_slice(&[0x00, 0x00]);
    body.extend_from_slice(params);
    tpkt(&body)
}

#[tokio::test]
async fn block_server_answers_db_read() {
    let publisher = ImagePublisher::<BlockImage>::new(&running_state());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(serve_block(listener, publisher.reader()));

    let mut stream = TcpStream::connect(addr).await.expect("connect");

    let cr = tpkt(&[
        0x11, 0xE0, 0x00, 0x00, 0x00, 0x01, 0x00, 0xC0, 0x01, 0x0A, 0xC1, 0x02, 0x01, 0x00, 0xC2,
        0x02, 0x01, 0x02,
    ]);
    let cc = exchange(&mut stream, &cr).await;
    assert_eq!(cc[1], 0xD0);

    let setup = s7_job(1, &[0xF0, 0x00, 0x00, 0x01, 0x00, 0x01, 0x01, 0xE0]);
    let ack = exchange(&mut stream, &setup).await;
    // COTP(3) + S7 ack header(12) + params(8)
    assert_eq!(ack[3 + 1], 0x03);
    assert_eq!(&ack[ack.len() - 2..], &[0x01, 0xE0]);

    let read = s7_job(
        2,
        &[
            0x04, 0x01, 0x12, 0x0A, 0x10, 0x02, 0x00, 0x08, 0x00, 0x01, 0x84, 0x00, 0x00, 0x00,
        ],
    );
    let ack = exchange(&mut stream, &read).await;
    let data = &ack[3 + 12 + 2..];
    assert_eq!(&data[..4], &[0xFF, 0x04, 0x00, 0x40]);
    let block = &data[4..12];
    assert_eq!(block[0] & 0x01, 1);
    assert_eq!(u16::from_be_bytes([block[2], block[3]]), 50);
    assert_eq!(i16::from_be_bytes([block[4], block[5]]), 161);
    assert_eq!(u16::from_be_bytes([block[6], block[7]]), 3244);

    server.abort();
}

/// 状态字段全部由同一个序号派生，任一映像中混入两拍的值都会破坏关系。
fn state_for(n: i32) -> ProcessState {
    ProcessState {
        running: n % 2 == 0,
        speed: n % 101,
        temperature_tenths_c: n % 1000,
        pressure_kpa: (n % 1000) * 3,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refreshed_images_never_tear() {
    let (state_tx, state_rx) = watch::channel(state_for(0));
    let registers = ImagePublisher::<RegisterImage>::new(&state_for(0));
    let blocks = ImagePublisher::<BlockImage>::new(&state_for(0));
    let register_reader = registers.reader();
    let block_reader = blocks.reader();

    let writer = tokio::spawn(async move {
        for n in 1..20_000 {
            state_tx.send_replace(state_for(n));
            if n % 64 == 0 {
                tokio::task::yield_now().await;
            }
        }
    });
    let refresh_registers = tokio::spawn(run_image_refresher(
        state_rx.clone(),
        registers,
        Duration::from_millis(1),
    ));
    let refresh_blocks = tokio::spawn(run_image_refresher(
        state_rx,
        blocks,
        Duration::from_millis(1),
    ));

    let deadline = Instant::now() + Duration::from_millis(300);
    while Instant::now() < deadline {
        let image = register_reader.load();
        let regs = image.holding_registers();
        let temp = regs[1] as i16 as i32;
        assert_eq!(regs[2] as i32, temp * 3);
        assert_eq!(image.coils()[0], temp % 2 == 0);

        let image = block_reader.load();
        let bytes = image.bytes();
        let temp = i16::from_be_bytes([bytes[4], bytes[5]]) as i32;
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]) as i32, temp * 3);
        assert_eq!(bytes[0] & 0x01 == 1, temp % 2 == 0);
        tokio::task::yield_now().await;
    }

    writer.await.expect("writer");
    refresh_registers.abort();
    refresh_blocks.abort();
}
