//! S7 (ISO-on-TCP) 帧编解码。
//!
//! 帧结构：
//!
//! ```text
//! TPKT (4)  : 03 00 len_hi len_lo          len 含 TPKT 头
//! COTP      : CR  LI E0 dst(2) src(2) class params...
//!             DT  02 F0 80
//! S7 header : 32 rosctr 00 00 pdu_ref(2) param_len(2) data_len(2) [err_class err_code]
//! ```
//!
//! 只实现控制器需要的子集：建立连接、协商 PDU、读变量。

use crate::error::ProtocolError;

pub const TPKT_VERSION: u8 = 0x03;
pub const TPKT_HEADER_LEN: usize = 4;

const COTP_CONNECT_REQUEST: u8 = 0xE0;
const COTP_CONNECT_CONFIRM: u8 = 0xD0;
const COTP_DATA: u8 = 0xF0;
const COTP_EOT: u8 = 0x80;
const COTP_LOCAL_REF: u16 = 0x0001;

const S7_PROTOCOL_ID: u8 = 0x32;
pub const ROSCTR_JOB: u8 = 0x01;
pub const ROSCTR_ACK_DATA: u8 = 0x03;
const S7_JOB_HEADER_LEN: usize = 10;
const S7_ACK_HEADER_LEN: usize = 12;

pub const FN_SETUP_COMMUNICATION: u8 = 0xF0;
pub const FN_READ_VAR: u8 = 0x04;

const VAR_SPEC: u8 = 0x12;
const SYNTAX_S7ANY: u8 = 0x10;
const READ_ITEM_LEN: usize = 12;

/// 数据块区域
pub const AREA_DB: u8 = 0x84;

pub const TS_BIT: u8 = 0x01;
const TS_RES_BIT: u8 = 0x03;
const TS_RES_BYTE: u8 = 0x04;

pub const RC_SUCCESS: u8 = 0xFF;
pub const RC_ADDRESS_OUT_OF_RANGE: u8 = 0x05;
pub const RC_OBJECT_NOT_EXIST: u8 = 0x0A;

pub const ERR_CLASS_FUNCTION: u8 = 0x81;
pub const ERR_CODE_NOT_IMPLEMENTED: u8 = 0x04;

/// 服务端支持的最大 PDU 长度。
pub const MAX_PDU_LENGTH: u16 = 480;

/// 校验 TPKT 头并返回载荷长度。
pub fn tpkt_payload_len(header: [u8; TPKT_HEADER_LEN]) -> Result<usize, ProtocolError> {
    if header[0] != TPKT_VERSION {
        return Err(ProtocolError::Frame(format!(
            "unsupported tpkt version 0x{:02X}",
            header[0]
        )));
    }
    let total = u16::from_be_bytes([header[2], header[3]]) as usize;
    // 至少容纳 COTP DT 头
    if total < TPKT_HEADER_LEN + 3 {
        return Err(ProtocolError::Frame(format!("tpkt length {} too short", total)));
    }
    Ok(total - TPKT_HEADER_LEN)
}

/// 加 TPKT 头。
pub fn frame_tpkt(body: &[u8]) -> Vec<u8> {
    let total = (body.len() + TPKT_HEADER_LEN) as u16;
    let mut out = Vec::with_capacity(total as usize);
    out.extend_from_slice(&[TPKT_VERSION, 0x00]);
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// 入站 COTP 报文。
#[derive(Debug, PartialEq, Eq)]
pub enum CotpPdu<'a> {
    ConnectRequest { src_ref: u16, params: &'a [u8] },
    Data(&'a [u8]),
}

pub fn parse_cotp(payload: &[u8]) -> Result<CotpPdu<'_>, ProtocolError> {
    let li = *payload
        .first()
        .ok_or_else(|| ProtocolError::Frame("empty cotp".to_string()))? as usize;
    if li < 2 || payload.len() < li + 1 {
        return Err(ProtocolError::Frame(format!("bad cotp length indicator {}", li)));
    }
    match payload[1] & 0xF0 {
        COTP_CONNECT_REQUEST => {
            if li < 6 {
                return Err(ProtocolError::Frame("short cotp connect request".to_string()));
            }
            Ok(CotpPdu::ConnectRequest {
                src_ref: u16::from_be_bytes([payload[4], payload[5]]),
                params: &payload[7..li + 1],
            })
        }
        COTP_DATA => Ok(CotpPdu::Data(&payload[li + 1..])),
        other => Err(ProtocolError::Frame(format!(
            "unsupported cotp pdu type 0x{:02X}",
            other
        ))),
    }
}

/// 连接确认（回显客户端的 TPDU/TSAP 参数）。
pub fn encode_connect_confirm(client_ref: u16, params: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(7 + params.len());
    body.push((6 + params.len()) as u8);
    body.push(COTP_CONNECT_CONFIRM);
    body.extend_from_slice(&client_ref.to_be_bytes());
    body.extend_from_slice(&COTP_LOCAL_REF.to_be_bytes());
    body.push(0x00);
    body.extend_from_slice(params);
    frame_tpkt(&body)
}

/// COTP DT + TPKT 包装一个 S7 PDU。
pub fn encode_data(s7_pdu: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(3 + s7_pdu.len());
    body.extend_from_slice(&[0x02, COTP_DATA, COTP_EOT]);
    body.extend_from_slice(s7_pdu);
    frame_tpkt(&body)
}

/// 读变量请求中的一项（S7ANY 地址）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadItem {
    pub transport_size: u8,
    pub count: u16,
    pub db_number: u16,
    pub area: u8,
    pub byte_offset: usize,
    pub bit_offset: u8,
}

impl ReadItem {
    /// 请求覆盖的字节数（位访问按 1 字节计）。
    pub fn byte_len(&self) -> usize {
        let element = match self.transport_size {
            TS_BIT | 0x02 | 0x03 => 1,
            0x04 | 0x05 => 2,
            0x06..=0x08 => 4,
            _ => 1,
        };
        element * self.count as usize
    }
}

/// 入站 S7 请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S7Request {
    SetupCommunication {
        pdu_ref: u16,
        max_amq_calling: u16,
        max_amq_called: u16,
        pdu_length: u16,
    },
    ReadVar {
        pdu_ref: u16,
        items: Vec<ReadItem>,
    },
    Unsupported {
        pdu_ref: u16,
        rosctr: u8,
        function: Option<u8>,
    },
}

fn be16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

pub fn parse_s7(pdu: &[u8]) -> Result<S7Request, ProtocolError> {
    if pdu.len() < S7_JOB_HEADER_LEN || pdu[0] != S7_PROTOCOL_ID {
        return Err(ProtocolError::Frame("not an s7 pdu".to_string()));
    }
    let rosctr = pdu[1];
    let pdu_ref = be16(pdu, 4);
    let param_len = be16(pdu, 6) as usize;
    let params = pdu
        .get(S7_JOB_HEADER_LEN..S7_JOB_HEADER_LEN + param_len)
        .ok_or_else(|| ProtocolError::Frame("s7 parameter block truncated".to_string()))?;

    if rosctr != ROSCTR_JOB {
        return Ok(S7Request::Unsupported {
            pdu_ref,
            rosctr,
            function: params.first().copied(),
        });
    }

    match params.first().copied() {
        Some(FN_SETUP_COMMUNICATION) => {
            if params.len() < 8 {
                return Err(ProtocolError::Frame("short setup communication".to_string()));
            }
            Ok(S7Request::SetupCommunication {
                pdu_ref,
                max_amq_calling: be16(params, 2),
                max_amq_called: be16(params, 4),
                pdu_length: be16(params, 6),
            })
        }
        Some(FN_READ_VAR) => {
            let count = *params
                .get(1)
                .ok_or_else(|| ProtocolError::Frame("read var without item count".to_string()))?
                as usize;
            let mut items = Vec::with_capacity(count);
            for index in 0..count {
                let start = 2 + index * READ_ITEM_LEN;
                let item = params.get(start..start + READ_ITEM_LEN).ok_or_else(|| {
                    ProtocolError::Frame(format!("read var item {} truncated", index))
                })?;
                if item[0] != VAR_SPEC || item[2] != SYNTAX_S7ANY {
                    return Err(ProtocolError::Frame(format!(
                        "unsupported address specification in item {}",
                        index
                    )));
                }
                let bit_address =
                    ((item[9] as usize) << 16) | ((item[10] as usize) << 8) | item[11] as usize;
                items.push(ReadItem {
                    transport_size: item[3],
                    count: be16(item, 4),
                    db_number: be16(item, 6),
                    area: item[8],
                    byte_offset: bit_address >> 3,
                    bit_offset: (bit_address & 0x07) as u8,
                });
            }
            Ok(S7Request::ReadVar { pdu_ref, items })
        }
        function => Ok(S7Request::Unsupported {
            pdu_ref,
            rosctr,
            function,
        }),
    }
}

/// 读变量单项结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    Bit(bool),
    Bytes(Vec<u8>),
    Error(u8),
}

/// 构造 AckData PDU。
pub fn encode_ack(pdu_ref: u16, error: (u8, u8), params: &[u8], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(S7_ACK_HEADER_LEN + params.len() + data.len());
    out.extend_from_slice(&[S7_PROTOCOL_ID, ROSCTR_ACK_DATA, 0x00, 0x00]);
    out.extend_from_slice(&pdu_ref.to_be_bytes());
    out.extend_from_slice(&(params.len() as u16).to_be_bytes());
    out.extend_from_slice(&(data.len() as u16).to_be_bytes());
    out.push(error.0);
    out.push(error.1);
    out.extend_from_slice(params);
    out.extend_from_slice(data);
    out
}

pub fn encode_setup_ack(
    pdu_ref: u16,
    max_amq_calling: u16,
    max_amq_called: u16,
    pdu_length: u16,
) -> Vec<u8> {
    let mut params = vec![FN_SETUP_COMMUNICATION, 0x00];
    params.extend_from_slice(&max_amq_calling.to_be_bytes());
    params.extend_from_slice(&max_amq_called.to_be_bytes());
    params.extend_from_slice(&pdu_length.to_be_bytes());
    encode_ack(pdu_ref, (0, 0), &params, &[])
}

pub fn encode_read_ack(pdu_ref: u16, results: &[ItemResult]) -> Vec<u8> {
    let params = [FN_READ_VAR, results.len() as u8];
    let mut data = Vec::new();
    for (index, result) in results.iter().enumerate() {
        let payload_len = match result {
            ItemResult::Bit(value) => {
                data.extend_from_slice(&[RC_SUCCESS, TS_RES_BIT, 0x00, 0x01, *value as u8]);
                1
            }
            ItemResult::Bytes(bytes) => {
                let bits = (bytes.len() * 8) as u16;
                data.extend_from_slice(&[RC_SUCCESS, TS_RES_BYTE]);
                data.extend_from_slice(&bits.to_be_bytes());
                data.extend_from_slice(bytes);
                bytes.len()
            }
            ItemResult::Error(code) => {
                data.extend_from_slice(&[*code, 0x00, 0x00, 0x00]);
                0
            }
        };
        // 非末项按偶数字节对齐
        if payload_len % 2 == 1 && index + 1 < results.len() {
            data.push(0x00);
        }
    }
    encode_ack(pdu_ref, (0, 0), &params, &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tpkt_header_checks_version_and_length() {
        assert_eq!(tpkt_payload_len([0x03, 0x00, 0x00, 0x16]).unwrap(), 18);
        assert!(tpkt_payload_len([0x04, 0x00, 0x00, 0x16]).is_err());
        assert!(tpkt_payload_len([0x03, 0x00, 0x00, 0x05]).is_err());
    }

    #[test]
    fn parse_connect_request() {
        let cr = [
            0x11, 0xE0, 0x00, 0x00, 0x00, 0x2A, 0x00, 0xC0, 0x01, 0x0A, 0xC1, 0x02, 0x01, 0x00,
            0xC2, 0x02, 0x01, 0x02,
        ];
        let pdu = parse_cotp(&cr).unwrap();
        assert_eq!(
            pdu,
            CotpPdu::ConnectRequest {
                src_ref: 0x002A,
                params: &cr[7..],
            }
        );
        let cc = encode_connect_confirm(0x002A, &cr[7..]);
        assert_eq!(&cc[..4], &[0x03, 0x00, 0x00, 0x16]);
        assert_eq!(&cc[4..11], &[0x11, 0xD0, 0x00, 0x2A, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn parse_read_var_item() {
        let pdu = [
            0x32, 0x01, 0x00, 0x00, 0x00, 0x07, 0x00, 0x0E, 0x00, 0x00, // header
            0x04, 0x01, // read var, 1 item
            0x12, 0x0A, 0x10, 0x02, 0x00, 0x06, 0x00, 0x01, 0x84, 0x00, 0x00, 0x10,
        ];
        let request = parse_s7(&pdu).unwrap();
        assert_eq!(
            request,
            S7Request::ReadVar {
                pdu_ref: 7,
                items: vec![ReadItem {
                    transport_size: 0x02,
                    count: 6,
                    db_number: 1,
                    area: AREA_DB,
                    byte_offset: 2,
                    bit_offset: 0,
                }],
            }
        );
    }

    #[test]
    fn truncated_params_are_frame_errors() {
        let pdu = [0x32, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x0E, 0x00, 0x00, 0x04];
        assert!(matches!(parse_s7(&pdu), Err(ProtocolError::Frame(_))));
    }

    #[test]
    fn read_ack_pads_odd_items() {
        let ack = encode_read_ack(
            3,
            &[ItemResult::Bytes(vec![0xAB]), ItemResult::Error(RC_OBJECT_NOT_EXIST)],
        );
        // header(12) + params(2)
        assert_eq!(&ack[12..14], &[FN_READ_VAR, 2]);
        assert_eq!(&ack[14..20], &[0xFF, 0x04, 0x00, 0x08, 0xAB, 0x00]);
        assert_eq!(&ack[20..24], &[RC_OBJECT_NOT_EXIST, 0, 0, 0]);
        assert_eq!(be16(&ack, 8), 10);
    }
}
