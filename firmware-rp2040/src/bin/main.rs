#![no_std]
#![no_main]

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{UART0, USB};
use embassy_rp::uart::{Async, Config as UartConfig, Uart, UartRx, UartTx};
use embassy_rp::usb::Driver;
use embassy_time::{with_timeout, Duration, Instant, Ticker};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use static_cell::StaticCell;

use hidlink_core::{Debouncer, Engine, InterruptFlag};
use hidlink_firmware_rp2040::hid::{HidEvent, KeyboardState, KeyboardWriter, MouseState, MouseWriter};
use hidlink_firmware_rp2040::io::{AckChannel, HidChannel, LogChannel, RxChannel};
use hidlink_firmware_rp2040::{
    configure_usb_hid, ChannelAckSink, ChannelHidDriver, ChannelLogSink, COMMAND_BAUD, LOG_BAUD,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::InterruptHandler<UART0>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Safety-stop flag: raised by the button task, serviced by the bridge task.
static INTERRUPT: InterruptFlag = InterruptFlag::new();

/// Bytes from the command UART to the pipeline.
static RX_BYTES: RxChannel = RxChannel::new();

/// ACK bytes from the pipeline to the command UART.
static ACK_BYTES: AckChannel = AckChannel::new();

/// Log lines from the pipeline to the log UART.
static LOG_LINES: LogChannel = LogChannel::new();

/// HID events from the pipeline to the USB HID task.
static HID_EVENTS: HidChannel = HidChannel::new();

/// USB device configuration buffers.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID interface states.
static KEYBOARD_HID_STATE: StaticCell<State> = StaticCell::new();
static MOUSE_HID_STATE: StaticCell<State> = StaticCell::new();

/// Current value of the monotonic millisecond counter.
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("hidlink starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Command link (UART0) ---
    let mut command_config = UartConfig::default();
    command_config.baudrate = COMMAND_BAUD;

    let uart0 = Uart::new(
        p.UART0,
        p.PIN_0, // TX
        p.PIN_1, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        command_config,
    );
    let (ack_tx, command_rx) = uart0.split();

    // --- Log channel (UART1, outbound only) ---
    let mut log_config = UartConfig::default();
    log_config.baudrate = LOG_BAUD;
    let log_tx = UartTx::new(p.UART1, p.PIN_8, p.DMA_CH2, log_config);

    // --- Panic button ---
    let button = Input::new(p.PIN_15, Pull::Up);

    // --- USB setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("hidlink");
    usb_config.product = Some("Serial HID Bridge");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 256]),
        CONTROL_BUF.init([0; 64]),
    );

    let (keyboard_writer, mouse_writer) = configure_usb_hid(
        &mut builder,
        KEYBOARD_HID_STATE.init(State::new()),
        MOUSE_HID_STATE.init(State::new()),
    );

    let usb_device = builder.build();

    // On-board LED indicates UART receive errors.
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(usb_task(usb_device)).unwrap();
    spawner.spawn(hid_task(keyboard_writer, mouse_writer)).unwrap();
    spawner.spawn(uart_rx_task(command_rx, led)).unwrap();
    spawner.spawn(ack_tx_task(ack_tx)).unwrap();
    spawner.spawn(log_tx_task(log_tx)).unwrap();
    spawner.spawn(button_task(button)).unwrap();
    spawner.spawn(bridge_task()).unwrap();

    info!("hidlink initialized, waiting for commands...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// The main loop: a non-blocking 1 ms iteration over the pipeline.
///
/// Order within one iteration matters: the interrupt flag is serviced
/// first, then received bytes are parsed and dispatched, then the executor
/// and the timed-action slot are polled.
#[embassy_executor::task]
async fn bridge_task() {
    let mut engine = Engine::new(
        ChannelHidDriver::new(&HID_EVENTS),
        ChannelAckSink::new(&ACK_BYTES),
        ChannelLogSink::new(&LOG_LINES),
    );
    engine.startup(now_ms(), env!("CARGO_PKG_VERSION"));

    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        engine.service_interrupt(&INTERRUPT, now_ms());

        while let Ok(byte) = RX_BYTES.try_receive() {
            engine.on_byte(byte, now_ms());
        }

        engine.poll(&INTERRUPT, now_ms());
        ticker.next().await;
    }
}

/// Reads single bytes from the command UART into the byte channel.
#[embassy_executor::task]
async fn uart_rx_task(mut rx: UartRx<'static, Async>, mut led: Output<'static>) {
    let mut byte = [0u8; 1];

    // Drop bytes that arrived before the pipeline was ready.
    while matches!(
        with_timeout(Duration::from_millis(5), rx.read(&mut byte)).await,
        Ok(Ok(()))
    ) {}

    loop {
        match rx.read(&mut byte).await {
            Ok(()) => RX_BYTES.send(byte[0]).await,
            Err(e) => {
                error!("UART rx error: {:?}", e);
                led.toggle();
            }
        }
    }
}

/// Writes ACK bytes back to the commanding host.
#[embassy_executor::task]
async fn ack_tx_task(mut tx: UartTx<'static, Async>) {
    loop {
        let byte = ACK_BYTES.receive().await;
        if let Err(e) = tx.write(&[byte]).await {
            error!("ACK tx error: {:?}", e);
        }
    }
}

/// Writes log lines to the auxiliary UART.
#[embassy_executor::task]
async fn log_tx_task(mut tx: UartTx<'static, Async>) {
    loop {
        let line = LOG_LINES.receive().await;
        let _ = tx.write(line.as_bytes()).await;
        let _ = tx.write(b"\r\n").await;
    }
}

/// The "ISR" context: debounces falling edges and raises the shared flag.
///
/// The debounce timestamp never leaves this task.
#[embassy_executor::task]
async fn button_task(mut button: Input<'static>) {
    let mut debouncer = Debouncer::new();
    loop {
        button.wait_for_falling_edge().await;
        if debouncer.accept(now_ms()) {
            INTERRUPT.raise();
        }
    }
}

/// Applies pipeline events to the HID report state and writes USB reports.
#[embassy_executor::task]
async fn hid_task(mut keyboard_writer: KeyboardWriter, mut mouse_writer: MouseWriter) {
    let mut keyboard = KeyboardState::new();
    let mut mouse = MouseState::new();

    keyboard_writer.ready().await;
    info!("USB HID ready, forwarding events...");

    loop {
        match HID_EVENTS.receive().await {
            HidEvent::MouseMove { x, y, wheel } => {
                let _ = mouse_writer.write(&mouse.move_report(x, y, wheel)).await;
            }
            HidEvent::MousePress(mask) => {
                let _ = mouse_writer.write(&mouse.press(mask)).await;
            }
            HidEvent::MouseRelease(mask) => {
                let _ = mouse_writer.write(&mouse.release(mask)).await;
            }
            HidEvent::MouseClick(mask) => {
                let _ = mouse_writer.write(&mouse.press(mask)).await;
                let _ = mouse_writer.write(&mouse.release(mask)).await;
            }
            HidEvent::KbPress(key) => {
                if let Some(report) = keyboard.press(key) {
                    let _ = keyboard_writer.write(&report).await;
                }
            }
            HidEvent::KbRelease(key) => {
                if let Some(report) = keyboard.release(key) {
                    let _ = keyboard_writer.write(&report).await;
                }
            }
            HidEvent::KbWrite(key) => {
                if let Some(report) = keyboard.press(key) {
                    let _ = keyboard_writer.write(&report).await;
                    if let Some(report) = keyboard.release(key) {
                        let _ = keyboard_writer.write(&report).await;
                    }
                }
            }
            HidEvent::KbReleaseAll => {
                let _ = keyboard_writer.write(&keyboard.release_all()).await;
            }
        }
    }
}
