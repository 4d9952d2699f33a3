use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::Stream;
use haierac_protocol::field::{POLL_REQUEST, POWER_ON_REQUEST};
use haierac_protocol::frame::Frame;
use haierac_protocol::{ApplianceState, ClimateState, Command};
use thiserror::Error;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use transport::{TransportReceiver, TransportSender};

pub mod transport;

/// Polls are never sent closer together than this
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Drives the poll/command cycle against one indoor unit.
///
/// Status frames are read in a background task and folded into the shared
/// [`ApplianceState`]; polls go out on a fixed interval. The state sits
/// behind one lock, taken for each whole decode or command merge.
pub struct Client {
    shared: Arc<Shared>,
    tasks: [task::JoinHandle<()>; 2],
}

struct Shared {
    state: Mutex<ApplianceState>,
    writer: AsyncMutex<TransportSender>,
    climate: watch::Sender<ClimateState>,
}

impl Client {
    pub async fn connect(opt: &transport::TransportOpt, poll_interval: Duration)
        -> Result<Self, transport::OpenError>
    {
        let (reader, writer) = transport::open(opt).await?;
        Ok(Client::new(reader, writer, poll_interval))
    }

    pub fn new(reader: TransportReceiver, writer: TransportSender, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval < MIN_POLL_INTERVAL {
            log::warn!("poll interval {poll_interval:?} too short, using {MIN_POLL_INTERVAL:?}");
            MIN_POLL_INTERVAL
        } else {
            poll_interval
        };

        let (climate, _) = watch::channel(ClimateState::default());

        let shared = Arc::new(Shared {
            state: Mutex::new(ApplianceState::new()),
            writer: AsyncMutex::new(writer),
            climate,
        });

        let read_task = task::spawn({
            let shared = shared.clone();
            async move {
                if let Err(err) = read_task(shared, reader).await {
                    log::error!("client task: {err}");
                }
            }
        });

        let poll_task = task::spawn(poll_task(shared.clone(), poll_interval));

        Client {
            shared,
            tasks: [read_task, poll_task],
        }
    }

    /// Climate state as of the last accepted status frame
    pub fn state(&self) -> ClimateState {
        self.shared.climate.borrow().clone()
    }

    /// Copy of the retained frame buffer
    pub fn frame(&self) -> Frame {
        self.shared.state.lock().unwrap().frame().clone()
    }

    /// Yields the climate state after every accepted status frame
    pub fn watch(&self) -> impl Stream<Item = ClimateState> + use<> {
        WatchStream::from_changes(self.shared.climate.subscribe())
    }

    /// Returns the current state, or waits for the first status frame if
    /// none has arrived yet.
    pub async fn wait_for_status(&self, timeout: Duration) -> Result<ClimateState, Error> {
        let rx = self.shared.climate.subscribe();

        if self.shared.state.lock().unwrap().has_status() {
            return Ok(self.state());
        }

        next_change(rx, timeout).await
    }

    /// Waits for the next status frame to arrive
    pub async fn next_status(&self, timeout: Duration) -> Result<ClimateState, Error> {
        next_change(self.shared.climate.subscribe(), timeout).await
    }

    /// Solicits a status frame right away, outside the poll interval
    pub async fn poll(&self) -> Result<(), Error> {
        self.shared.send(&POLL_REQUEST).await?;
        Ok(())
    }

    pub async fn power_on(&self) -> Result<(), Error> {
        self.shared.send(&POWER_ON_REQUEST).await?;
        Ok(())
    }

    /// Merges `command` into the last reported status and sends the result.
    /// Refused until at least one status frame has been received, since the
    /// frame would otherwise reset every setting the command leaves alone.
    pub async fn command(&self, command: &Command) -> Result<(), Error> {
        let bytes = {
            let mut state = self.shared.state.lock().unwrap();
            if !state.has_status() {
                return Err(Error::NoStatus);
            }
            state.command(command)
        };

        log::info!("sending command: {command:?}");
        self.shared.send(&bytes).await?;
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("sending frame: {0}")]
    Send(#[from] io::Error),
    #[error("no status frame received from the unit yet")]
    NoStatus,
    #[error("timed out waiting for a status frame")]
    Timeout,
}

impl Shared {
    async fn send(&self, bytes: &[u8]) -> Result<(), io::Error> {
        let mut writer = self.writer.lock().await;
        writer.send(bytes).await
    }

    /// Publishes while still holding the state lock, so `has_status` never
    /// runs ahead of the watched climate state.
    fn on_frame(&self, frame: Frame) {
        let mut state = self.state.lock().unwrap();
        let climate = match state.accept(frame) {
            Ok(climate) => climate.clone(),
            Err(err) => {
                log::warn!("status frame: {err}");
                return;
            }
        };

        log::info!("status: {climate}");
        self.climate.send_replace(climate);
    }
}

async fn read_task(shared: Arc<Shared>, mut rx: TransportReceiver) -> io::Result<()> {
    loop {
        let frame = rx.read().await?;
        shared.on_frame(frame);
    }
}

async fn poll_task(shared: Arc<Shared>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(err) = shared.send(&POLL_REQUEST).await {
            log::warn!("sending poll: {err}");
        }
    }
}

async fn next_change(mut rx: watch::Receiver<ClimateState>, timeout: Duration)
    -> Result<ClimateState, Error>
{
    match tokio::time::timeout(timeout, rx.changed()).await {
        Ok(Ok(())) => Ok(rx.borrow_and_update().clone()),
        // sender lives as long as the client
        Ok(Err(_)) => Err(Error::Timeout),
        Err(_) => Err(Error::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haierac_protocol::field::types::Celsius;
    use haierac_protocol::field::{FAN_SPEED, MODE, POWER, SET_TEMPERATURE, SWING};
    use haierac_protocol::frame::{FRAME_SIZE, REQUEST_SIZE};
    use haierac_protocol::{FanMode, HvacMode};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    const WAIT: Duration = Duration::from_secs(5);
    const NEVER: Duration = Duration::from_secs(3600);

    struct Device {
        rd: ReadHalf<DuplexStream>,
        wr: WriteHalf<DuplexStream>,
    }

    impl Device {
        async fn read_request(&mut self) -> [u8; REQUEST_SIZE] {
            let mut buf = [0u8; REQUEST_SIZE];
            self.rd.read_exact(&mut buf).await.unwrap();
            buf
        }

        async fn read_frame(&mut self) -> Frame {
            let mut buf = [0u8; FRAME_SIZE];
            self.rd.read_exact(&mut buf).await.unwrap();
            Frame::parse(&buf).unwrap()
        }
    }

    fn start() -> (Client, Device) {
        start_polling(NEVER)
    }

    fn start_polling(interval: Duration) -> (Client, Device) {
        let (device, host) = tokio::io::duplex(256);
        let (host_rd, host_wr) = tokio::io::split(host);
        let (rd, wr) = tokio::io::split(device);

        let client = Client::new(
            TransportReceiver::new(host_rd),
            TransportSender::new(host_wr),
            interval,
        );

        (client, Device { rd, wr })
    }

    fn status_bytes() -> [u8; FRAME_SIZE] {
        let mut frame = Frame::zeroed();
        frame.set(13, 24);
        frame.set(MODE, 2);
        frame.set(FAN_SPEED, 3);
        frame.set(SWING, 1);
        frame.set(POWER, 9);
        frame.set(SET_TEMPERATURE, 6);
        frame.serialize()
    }

    #[tokio::test]
    async fn polls_and_decodes_status() {
        let (client, mut device) = start();

        assert_eq!(device.read_request().await, POLL_REQUEST);
        device.wr.write_all(&status_bytes()).await.unwrap();

        let state = client.wait_for_status(WAIT).await.unwrap();
        assert_eq!(state.current_temperature, Some(Celsius(24)));
        assert_eq!(state.target_temperature, Some(Celsius(22)));
        assert_eq!(state.mode, Some(HvacMode::Heat));
        assert_eq!(state.fan, Some(FanMode::Auto));
        assert_eq!(client.frame().as_bytes(), &status_bytes());
    }

    #[tokio::test]
    async fn command_refused_before_status() {
        let (client, _device) = start();

        let result = client.command(&Command::new().with_mode(HvacMode::Cool)).await;
        assert!(matches!(result, Err(Error::NoStatus)));
    }

    #[tokio::test]
    async fn command_merges_into_last_status() {
        let (client, mut device) = start();

        device.read_request().await;
        device.wr.write_all(&status_bytes()).await.unwrap();
        client.wait_for_status(WAIT).await.unwrap();

        let command = Command::from_call(Some(HvacMode::Cool), None, Some(Celsius(23)));
        client.command(&command).await.unwrap();

        let sent = device.read_frame().await;
        assert_eq!(sent.get(POWER), 9);
        assert_eq!(sent.get(MODE), 1);
        assert_eq!(sent.get(SET_TEMPERATURE), 7);
        assert_eq!(sent.get(FAN_SPEED), 3);
        assert_eq!(sent.get(SWING), 1);
        assert_eq!(sent.get(17), 0);
    }

    #[tokio::test]
    async fn corrupted_status_is_ignored() {
        let (client, mut device) = start();
        device.read_request().await;

        let mut corrupt = status_bytes();
        corrupt[20] ^= 0xff;
        device.wr.write_all(&corrupt).await.unwrap();

        let mut valid = Frame::from_bytes(status_bytes());
        valid.set(13, 19);
        device.wr.write_all(&valid.serialize()).await.unwrap();

        let state = client.wait_for_status(WAIT).await.unwrap();
        assert_eq!(state.current_temperature, Some(Celsius(19)));
    }

    #[tokio::test]
    async fn power_on_sends_template() {
        let (client, mut device) = start();
        device.read_request().await;

        client.power_on().await.unwrap();
        assert_eq!(device.read_request().await, POWER_ON_REQUEST);
    }

    #[tokio::test]
    async fn zero_poll_interval_falls_back_to_minimum() {
        let (client, mut device) = start_polling(Duration::ZERO);

        let request = tokio::time::timeout(WAIT, device.read_request()).await.unwrap();
        assert_eq!(request, POLL_REQUEST);
        assert!(!client.tasks[1].is_finished());
    }

    #[tokio::test]
    async fn status_is_published_with_has_status() {
        let (client, _device) = start();

        client.shared.on_frame(Frame::from_bytes(status_bytes()));

        assert!(client.shared.state.lock().unwrap().has_status());
        let state = client.wait_for_status(Duration::ZERO).await.unwrap();
        assert_eq!(state.current_temperature, Some(Celsius(24)));
        assert_eq!(state.mode, Some(HvacMode::Heat));
    }
}
