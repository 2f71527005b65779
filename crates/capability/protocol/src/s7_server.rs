//! S7 数据块服务端
//!
//! 监听 ISO-on-TCP 端口，把 [`BlockImage`] 作为 DB1 只读暴露。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let listener = TcpListener::bind("0.0.0.0:1102").await?;
//! serve_block(listener, publisher.reader()).await?;
//! ```

use crate::error::ProtocolError;
use crate::image::{BlockImage, ImageReader};
use crate::s7_codec::{
    AREA_DB, CotpPdu, ERR_CLASS_FUNCTION, ERR_CODE_NOT_IMPLEMENTED, ItemResult, MAX_PDU_LENGTH,
    RC_ADDRESS_OUT_OF_RANGE, RC_OBJECT_NOT_EXIST, ReadItem, S7Request, TPKT_HEADER_LEN, TS_BIT,
    encode_ack, encode_connect_confirm, encode_data, encode_read_ack, encode_setup_ack, parse_cotp,
    parse_s7, tpkt_payload_len,
};
use std::io::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

impl BlockImage {
    /// 读取单项；整个请求应使用同一份映像。
    pub fn read_item(&self, item: &ReadItem) -> ItemResult {
        if item.area != AREA_DB || item.db_number != self.db_number() {
            return ItemResult::Error(RC_OBJECT_NOT_EXIST);
        }
        let bytes = self.bytes();
        if item.transport_size == TS_BIT {
            return match bytes.get(item.byte_offset) {
                Some(byte) => ItemResult::Bit((byte >> item.bit_offset) & 0x01 == 1),
                None => ItemResult::Error(RC_ADDRESS_OUT_OF_RANGE),
            };
        }
        let end = item.byte_offset + item.byte_len();
        match bytes.get(item.byte_offset..end) {
            Some(slice) if !slice.is_empty() => ItemResult::Bytes(slice.to_vec()),
            _ => ItemResult::Error(RC_ADDRESS_OUT_OF_RANGE),
        }
    }
}

/// 运行 S7 服务端，直到监听失败或任务被取消。
pub async fn serve_block(
    listener: TcpListener,
    image: ImageReader<BlockImage>,
) -> Result<(), ProtocolError> {
    let local_addr = listener.local_addr()?;
    info!(target: "plc.s7", addr = %local_addr, "s7 server listening");

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                debug!(target: "plc.s7", peer = %peer_addr, "new connection");
                let image = image.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, image).await {
                        warn!(target: "plc.s7", peer = %peer_addr, error = %e, "connection error");
                    }
                });
            }
            Err(e) => {
                error!(target: "plc.s7", error = %e, "failed to accept connection");
            }
        }
    }
}

/// 会话状态：协商后的 PDU 长度。
struct Session {
    pdu_length: u16,
}

impl Session {
    fn respond(&mut self, request: S7Request, image: &BlockImage) -> Vec<u8> {
        match request {
            S7Request::SetupCommunication {
                pdu_ref,
                max_amq_calling,
                max_amq_called,
                pdu_length,
            } => {
                self.pdu_length = pdu_length.clamp(1, MAX_PDU_LENGTH);
                encode_setup_ack(pdu_ref, max_amq_calling, max_amq_called, self.pdu_length)
            }
            S7Request::ReadVar { pdu_ref, items } => {
                let results: Vec<ItemResult> =
                    items.iter().map(|item| image.read_item(item)).collect();
                encode_read_ack(pdu_ref, &results)
            }
            S7Request::Unsupported {
                pdu_ref,
                rosctr,
                function,
            } => {
                debug!(target: "plc.s7", rosctr, function = ?function, "unsupported s7 request");
                let params: Vec<u8> = function.into_iter().collect();
                encode_ack(
                    pdu_ref,
                    (ERR_CLASS_FUNCTION, ERR_CODE_NOT_IMPLEMENTED),
                    &params,
                    &[],
                )
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    image: ImageReader<BlockImage>,
) -> Result<(), ProtocolError> {
    let mut session = Session {
        pdu_length: MAX_PDU_LENGTH,
    };

    while let Some(payload) = read_tpkt(&mut stream).await? {
        let reply = match parse_cotp(&payload)? {
            CotpPdu::ConnectRequest { src_ref, params } => encode_connect_confirm(src_ref, params),
            CotpPdu::Data(s7_pdu) => {
                let request = parse_s7(s7_pdu)?;
                let image = image.load();
                encode_data(&session.respond(request, &image))
            }
        };
        stream.write_all(&reply).await?;
    }
    Ok(())
}

/// 读取一个完整 TPKT 帧的载荷；对端正常关闭时返回 None。
async fn read_tpkt(stream: &mut TcpStream) -> Result<Option<Vec<u8>>, ProtocolError> {
    let mut header = [0u8; TPKT_HEADER_LEN];
    match stream.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = tpkt_payload_len(header)?;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ProcessImage;
    use domain::ProcessState;

    fn image() -> BlockImage {
        BlockImage::capture(&ProcessState {
            running: true,
            speed: 50,
            temperature_tenths_c: 160,
            pressure_kpa: 3250,
        })
    }

    fn item(transport_size: u8, count: u16, db_number: u16, byte_offset: usize) -> ReadItem {
        ReadItem {
            transport_size,
            count,
            db_number,
            area: AREA_DB,
            byte_offset,
            bit_offset: 0,
        }
    }

    #[test]
    fn read_bytes_and_bits() {
        let image = image();
        assert_eq!(
            image.read_item(&item(0x02, 2, 1, 2)),
            ItemResult::Bytes(vec![0x00, 0x32])
        );
        assert_eq!(image.read_item(&item(TS_BIT, 1, 1, 0)), ItemResult::Bit(true));
        assert_eq!(
            image.read_item(&item(0x04, 3, 1, 2)),
            ItemResult::Bytes(vec![0x00, 0x32, 0x00, 0xA0, 0x0C, 0xB2])
        );
    }

    #[test]
    fn unknown_block_and_range_errors() {
        let image = image();
        assert_eq!(
            image.read_item(&item(0x02, 2, 9, 0)),
            ItemResult::Error(RC_OBJECT_NOT_EXIST)
        );
        assert_eq!(
            image.read_item(&item(0x02, 8, 1, 60)),
            ItemResult::Error(RC_ADDRESS_OUT_OF_RANGE)
        );
        let mut input_area = item(0x02, 1, 1, 0);
        input_area.area = 0x81;
        assert_eq!(
            image.read_item(&input_area),
            ItemResult::Error(RC_OBJECT_NOT_EXIST)
        );
    }

    #[test]
    fn setup_negotiates_capped_pdu_length() {
        let mut session = Session { pdu_length: 0 };
        let ack = session.respond(
            S7Request::SetupCommunication {
                pdu_ref: 1,
                max_amq_calling: 1,
                max_amq_called: 1,
                pdu_length: 960,
            },
            &image(),
        );
        assert_eq!(session.pdu_length, MAX_PDU_LENGTH);
        assert_eq!(&ack[ack.len() - 2..], &MAX_PDU_LENGTH.to_be_bytes());
    }

    #[test]
    fn unsupported_function_gets_error_header() {
        let mut session = Session {
            pdu_length: MAX_PDU_LENGTH,
        };
        let ack = session.respond(
            S7Request::Unsupported {
                pdu_ref: 4,
                rosctr: 1,
                function: Some(0x05),
            },
            &image(),
        );
        assert_eq!(&ack[10..12], &[ERR_CLASS_FUNCTION, ERR_CODE_NOT_IMPLEMENTED]);
        assert_eq!(ack[12], 0x05);
    }
}
