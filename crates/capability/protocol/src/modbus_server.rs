//! Modbus TCP 服务端
//!
//! 单设备（接受任意 unit id），只读：
//! - 读线圈 (0x01)：线圈 0 = 运行
//! - 读保持寄存器 (0x03)：0 = 转速，1 = 温度（i16），2 = 压力
//!
//! 其他功能码返回 `IllegalFunction`，越界地址返回 `IllegalDataAddress`。

use crate::error::ProtocolError;
use crate::image::{ImageReader, RegisterImage};
use std::future;
use tokio::net::TcpListener;
use tokio_modbus::server::tcp::{Server, accept_tcp_connection};
use tokio_modbus::{ExceptionCode, Request, Response};
use tracing::{info, warn};

impl RegisterImage {
    /// 按映像应答一次请求。
    pub fn respond(&self, request: &Request<'_>) -> Result<Response, ExceptionCode> {
        match request {
            Request::ReadCoils(address, quantity) => {
                read_range(self.coils(), *address, *quantity).map(Response::ReadCoils)
            }
            Request::ReadHoldingRegisters(address, quantity) => {
                read_range(self.holding_registers(), *address, *quantity)
                    .map(Response::ReadHoldingRegisters)
            }
            _ => Err(ExceptionCode::IllegalFunction),
        }
    }
}

fn read_range<T: Copy>(data: &[T], address: u16, quantity: u16) -> Result<Vec<T>, ExceptionCode> {
    if quantity == 0 {
        return Err(ExceptionCode::IllegalDataValue);
    }
    let start = address as usize;
    let end = start + quantity as usize;
    data.get(start..end)
        .map(|slice| slice.to_vec())
        .ok_or(ExceptionCode::IllegalDataAddress)
}

/// 每个连接一个服务实例，共享同一映像读取端。
struct RegisterService {
    image: ImageReader<RegisterImage>,
}

impl tokio_modbus::server::Service for RegisterService {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, request: Self::Request) -> Self::Future {
        // 整个请求只读同一份映像
        let image = self.image.load();
        future::ready(image.respond(&request))
    }
}

/// 运行 Modbus TCP 服务端，直到监听失败或任务被取消。
pub async fn serve_registers(
    listener: TcpListener,
    image: ImageReader<RegisterImage>,
) -> Result<(), ProtocolError> {
    let local_addr = listener.local_addr()?;
    info!(target: "plc.modbus", addr = %local_addr, "modbus server listening");

    let server = Server::new(listener);
    let on_connected = move |stream, socket_addr| {
        let image = image.clone();
        async move {
            accept_tcp_connection(stream, socket_addr, move |_| {
                Ok(Some(RegisterService {
                    image: image.clone(),
                }))
            })
        }
    };
    server
        .serve(&on_connected, |err| {
            warn!(target: "plc.modbus", error = %err, "modbus connection error");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ProcessImage;
    use domain::ProcessState;

    fn image() -> RegisterImage {
        RegisterImage::capture(&ProcessState {
            running: true,
            speed: 42,
            temperature_tenths_c: 171,
            pressure_kpa: 2810,
        })
    }

    #[test]
    fn read_coil_and_registers() {
        let image = image();
        assert_eq!(
            image.respond(&Request::ReadCoils(0, 1)),
            Ok(Response::ReadCoils(vec![true]))
        );
        assert_eq!(
            image.respond(&Request::ReadHoldingRegisters(0, 3)),
            Ok(Response::ReadHoldingRegisters(vec![42, 171, 2810]))
        );
    }

    #[test]
    fn out_of_range_is_illegal_address() {
        let image = image();
        assert_eq!(
            image.respond(&Request::ReadHoldingRegisters(30, 3)),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(
            image.respond(&Request::ReadCoils(0, 0)),
            Err(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn writes_are_rejected() {
        let image = image();
        assert_eq!(
            image.respond(&Request::WriteSingleCoil(0, false)),
            Err(ExceptionCode::IllegalFunction)
        );
        assert_eq!(
            image.respond(&Request::WriteSingleRegister(0, 10)),
            Err(ExceptionCode::IllegalFunction)
        );
    }
}
