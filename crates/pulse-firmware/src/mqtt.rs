//! MQTT connect/publish/disconnect over an embassy-net TCP socket.

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::Duration;
use log::{info, warn};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;

/// Socket inactivity timeout; the broker pings are well inside this.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

const SOCKET_BUFFER: usize = 1024;
const PACKET_BUFFER: usize = 512;

/// Everything connect/publish can fail with.
#[derive(Debug)]
pub enum MqttError {
    /// Broker hostname did not resolve.
    DnsFailed,
    /// TCP connection to the broker failed.
    ConnectFailed,
    /// The MQTT layer rejected an operation.
    Protocol(ReasonCode),
}

/// Backing storage for the socket and packet buffers.
///
/// Lives as long as the handler; kept separate so it can sit in a
/// `StaticCell` while the handler itself stays on the stack.
pub struct MqttBuffers {
    rx: [u8; SOCKET_BUFFER],
    tx: [u8; SOCKET_BUFFER],
    packet_recv: [u8; PACKET_BUFFER],
    packet_send: [u8; PACKET_BUFFER],
}

impl MqttBuffers {
    pub const fn new() -> Self {
        Self {
            rx: [0; SOCKET_BUFFER],
            tx: [0; SOCKET_BUFFER],
            packet_recv: [0; PACKET_BUFFER],
            packet_send: [0; PACKET_BUFFER],
        }
    }
}

impl Default for MqttBuffers {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MqttHandler<'a> {
    client: MqttClient<'a, TcpSocket<'a>, 5, CountingRng>,
}

impl<'a> MqttHandler<'a> {
    /// Resolve the broker, open the socket and complete the MQTT handshake.
    ///
    /// `client_id` doubles as the session identity on the broker; the
    /// caller passes the device MAC.
    pub async fn connect(
        stack: Stack<'a>,
        buffers: &'a mut MqttBuffers,
        host: &str,
        port: u16,
        client_id: &'a str,
    ) -> Result<MqttHandler<'a>, MqttError> {
        let address = resolve(stack, host).await?;

        let mut socket = TcpSocket::new(stack, &mut buffers.rx, &mut buffers.tx);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        socket.connect((address, port)).await.map_err(|e| {
            warn!("TCP connect to {}:{} failed: {:?}", host, port, e);
            MqttError::ConnectFailed
        })?;

        let mut config: ClientConfig<'a, 5, CountingRng> =
            ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_client_id(client_id);
        config.max_packet_size = PACKET_BUFFER as u32;

        let mut client = MqttClient::new(
            socket,
            &mut buffers.packet_send,
            PACKET_BUFFER,
            &mut buffers.packet_recv,
            PACKET_BUFFER,
            config,
        );
        client
            .connect_to_broker()
            .await
            .map_err(MqttError::Protocol)?;

        info!("Sensor {} connected to MQTT broker {}:{}", client_id, host, port);
        Ok(Self { client })
    }

    /// Publish one serialized payload at QoS 0.
    pub async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        self.client
            .send_message(topic, payload, QualityOfService::QoS0, false)
            .await
            .map_err(MqttError::Protocol)
    }

    pub async fn disconnect(&mut self) -> Result<(), MqttError> {
        self.client.disconnect().await.map_err(MqttError::Protocol)
    }
}

/// Parse `host` as an IP literal or fall back to a DNS A query.
async fn resolve(stack: Stack<'_>, host: &str) -> Result<IpAddress, MqttError> {
    if let Ok(address) = host.parse::<IpAddress>() {
        return Ok(address);
    }

    let addresses = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|e| {
            warn!("DNS query for {} failed: {:?}", host, e);
            MqttError::DnsFailed
        })?;
    addresses.first().copied().ok_or(MqttError::DnsFailed)
}
