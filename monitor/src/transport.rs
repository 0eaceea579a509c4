use std::{
    io::{ErrorKind, Read, Write},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use eyre::{Result, WrapErr, bail, eyre};
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info, warn};

use crate::settings::{Backend, ModemSettings};

/// Sends one AT command and returns the complete response text.
pub trait AtTransport {
    fn send(&mut self, command: &str) -> Result<String>;
}

impl<T: AtTransport + ?Sized> AtTransport for &mut T {
    fn send(&mut self, command: &str) -> Result<String> {
        (**self).send(command)
    }
}

impl<T: AtTransport + ?Sized> AtTransport for Box<T> {
    fn send(&mut self, command: &str) -> Result<String> {
        (**self).send(command)
    }
}

/// Opens the transport selected by `[modem] backend`.
pub fn connect(modem: &ModemSettings) -> Result<Box<dyn AtTransport>> {
    match modem.backend {
        Backend::Serial => {
            let device = if modem.auto_detect() {
                auto_detect_port(modem.baudrate)?
            } else {
                modem.device.clone()
            };
            let port = SerialTransport::open(
                &device,
                modem.baudrate,
                modem.timeout(),
            )?;
            info!(%device, "opened modem serial port");
            Ok(Box::new(port))
        }
        Backend::GlModem => {
            info!(bus = %modem.bus_id, "using gl_modem");
            Ok(Box::new(CommandTransport::gl_modem(
                &modem.bus_id,
                modem.timeout(),
            )))
        }
    }
}

/// AT port of the modem, e.g. `/dev/ttyUSB2`.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

/// Granularity of reads while waiting for the terminator line.
const READ_SLICE: Duration = Duration::from_millis(100);

impl SerialTransport {
    pub fn open(
        device: &str,
        baudrate: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let port = serialport::new(device, baudrate)
            .timeout(READ_SLICE.min(timeout))
            .open()
            .wrap_err_with(|| {
                format!("failed to open serial port '{device}'")
            })?;

        Ok(Self { port, timeout })
    }
}

impl AtTransport for SerialTransport {
    fn send(&mut self, command: &str) -> Result<String> {
        if let Err(e) = self.port.clear(ClearBuffer::Input) {
            debug!(error = %e, "could not clear serial input buffer");
        }

        exchange(&mut self.port, command, self.timeout)
    }
}

/// Writes `command\r`, then reads until a terminator line or `timeout`.
///
/// Running out of time with a partial response returns what arrived; running
/// out of time with nothing at all is an error.
pub fn exchange<P: Read + Write + ?Sized>(
    port: &mut P,
    command: &str,
    timeout: Duration,
) -> Result<String> {
    debug!(command, "sending AT command");
    port.write_all(format!("{command}\r").as_bytes())
        .and_then(|()| port.flush())
        .wrap_err_with(|| format!("failed to write '{command}'"))?;

    let deadline = Instant::now() + timeout;
    let mut response = String::new();
    let mut buf = [0u8; 1024];

    while terminator(&response).is_none() {
        if Instant::now() >= deadline {
            if response.trim().is_empty() {
                bail!("no response to '{command}' within {timeout:?}");
            }
            warn!(
                command,
                "response incomplete at timeout, using partial data"
            );
            break;
        }
        match port.read(&mut buf) {
            Ok(0) => {
                if response.trim().is_empty() {
                    bail!("port closed before responding to '{command}'");
                }
                warn!(command, "port closed mid-response, using partial data");
                break;
            }
            Ok(n) => response.push_str(&String::from_utf8_lossy(&buf[..n])),
            Err(e) if is_transient(e.kind()) => {}
            Err(e) => {
                return Err(e).wrap_err_with(|| {
                    format!("failed to read response to '{command}'")
                });
            }
        }
    }
    log_response(command, &response);

    Ok(response)
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// The first complete line reading `OK`, `ERROR`, `+CME ERROR: ...` or
/// `+CMS ERROR: ...`.
fn terminator(response: &str) -> Option<&str> {
    response
        .split_inclusive('\n')
        .filter(|line| line.ends_with('\n'))
        .map(str::trim)
        .find(|line| is_status_line(line))
}

fn is_status_line(line: &str) -> bool {
    line == "OK"
        || line == "ERROR"
        || line.starts_with("+CME ERROR")
        || line.starts_with("+CMS ERROR")
}

/// Last status line of a response, complete or not.
pub(crate) fn final_status(response: &str) -> Option<&str> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| is_status_line(line))
        .next_back()
}

fn log_response(command: &str, response: &str) {
    match final_status(response) {
        Some(status) if status != "OK" => warn!(
            command,
            status,
            response = response.trim(),
            "AT command returned an error"
        ),
        _ => debug!(command, response = response.trim(), "AT command response"),
    }
}

/// Timeout for each candidate while detecting the AT port.
const DETECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Finds the AT port among the `ttyUSB` serial ports: the first one, in
/// numeric order, that answers `ATI` with a Quectel identification.
pub fn auto_detect_port(baudrate: u32) -> Result<String> {
    let ports = serialport::available_ports()
        .wrap_err("failed to list serial ports")?
        .into_iter()
        .map(|port| port.port_name)
        .filter(|name| name.contains("ttyUSB"))
        .collect::<Vec<_>>();
    debug!(?ports, "searching for the modem AT port");

    detect_port(ports, |device| {
        SerialTransport::open(device, baudrate, DETECT_TIMEOUT)?.send("ATI")
    })
    .ok_or_else(|| eyre!("no serial port answered ATI as a Quectel modem"))
}

/// Asks `candidates` in numeric order of their trailing digits.
fn detect_port(
    mut candidates: Vec<String>,
    mut identify: impl FnMut(&str) -> Result<String>,
) -> Option<String> {
    candidates.sort_by_key(|name| (port_number(name), name.clone()));

    candidates.into_iter().find(|device| match identify(device) {
        Ok(response) => response.contains("Quectel"),
        Err(e) => {
            debug!(%device, error = %e, "port did not answer");
            false
        }
    })
}

fn port_number(name: &str) -> Option<u32> {
    let prefix = name.trim_end_matches(|c: char| c.is_ascii_digit());
    name[prefix.len()..].parse().ok()
}

/// Name of the AT helper on GL.iNet firmware.
pub const GL_MODEM: &str = "gl_modem";

/// Runs an external AT helper, `<program> -B <bus> AT <command>`, once per
/// command and returns what it prints.
pub struct CommandTransport {
    program: String,
    bus_id: String,
    timeout: Duration,
}

impl CommandTransport {
    pub fn new(program: &str, bus_id: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_owned(),
            bus_id: bus_id.to_owned(),
            timeout,
        }
    }

    pub fn gl_modem(bus_id: &str, timeout: Duration) -> Self {
        Self::new(GL_MODEM, bus_id, timeout)
    }
}

impl AtTransport for CommandTransport {
    fn send(&mut self, command: &str) -> Result<String> {
        debug!(program = %self.program, command, "running AT helper");
        let child = Command::new(&self.program)
            .args(["-B", &self.bus_id, "AT", command])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .wrap_err_with(|| format!("failed to run {}", self.program))?;
        let output = wait_with_timeout(child, self.timeout)
            .wrap_err_with(|| format!("{} '{command}'", self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stdout.trim().is_empty() {
                bail!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                );
            }
            warn!(
                program = %self.program,
                status = %output.status,
                stderr = %stderr.trim(),
                "AT helper failed, using its output"
            );
        }
        log_response(command, &stdout);

        Ok(stdout)
    }
}

/// Interval between checks on a running helper.
const POLL_CHILD: Duration = Duration::from_millis(20);

/// Waits for `child` to exit and collects its output. Kills it once
/// `timeout` has passed.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
) -> Result<std::process::Output> {
    let deadline = Instant::now() + timeout;
    loop {
        if child.try_wait()?.is_some() {
            return Ok(child.wait_with_output()?);
        }
        if Instant::now() >= deadline {
            if let Err(e) = child.kill() {
                debug!(error = %e, "failed to kill timed out helper");
            }
            let _ = child.wait();
            bail!("no response within {timeout:?}");
        }
        thread::sleep(POLL_CHILD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::VecDeque, io};

    /// Replays scripted reads; an empty chunk stands for a read timeout.
    struct FakePort {
        written: Vec<u8>,
        reads: VecDeque<Vec<u8>>,
    }

    impl FakePort {
        fn new(chunks: &[&str]) -> Self {
            Self {
                written: Vec::new(),
                reads: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
            }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(chunk) if chunk.is_empty() => {
                    Err(io::ErrorKind::TimedOut.into())
                }
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(io::ErrorKind::TimedOut.into()),
            }
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reads_across_chunks_until_ok() {
        let mut port = FakePort::new(&[
            "+QSPN: \"I TIM\",\"TIM\",",
            "",
            "\"\",0,\"22201\"\r\n\r\nO",
            "K\r\n",
            "junk",
        ]);
        let response =
            exchange(&mut port, "AT+QSPN", Duration::from_secs(1)).unwrap();

        assert_eq!(port.written, b"AT+QSPN\r");
        assert!(response.ends_with("OK\r\n"));
        assert!(!response.contains("junk"));
        assert_eq!(port.reads.len(), 1);
    }

    #[test]
    fn stops_at_cme_error() {
        let mut port = FakePort::new(&["\r\n+CME ERROR: 10\r\n"]);
        let command = "AT+QNWLOCK=\"common/5g\"";
        let response =
            exchange(&mut port, command, Duration::from_secs(1)).unwrap();
        assert!(response.contains("+CME ERROR: 10"));
    }

    #[test]
    fn ok_inside_a_field_is_not_a_terminator() {
        assert_eq!(terminator("+QSPN: \"OK\",\"OK\"\r\n"), None);
        assert_eq!(terminator("\r\nOK"), None);
        assert_eq!(terminator("\r\nOK\r\n"), Some("OK"));
        assert_eq!(terminator("\r\nERROR\r\n"), Some("ERROR"));
    }

    #[test]
    fn error_text_in_a_field_is_not_a_failure() {
        let ok = "+QSPN: \"ERROR NET\",\"ERR\",\"\",0,\"22201\"\r\nOK\r\n";
        assert_eq!(final_status(ok), Some("OK"));
        assert_eq!(
            final_status("\r\n+CME ERROR: 3\r\n"),
            Some("+CME ERROR: 3")
        );
        assert_eq!(final_status("\r\nERROR"), Some("ERROR"));
        assert_eq!(final_status("Quectel\r\n"), None);
    }

    #[test]
    fn detects_the_port_answering_as_quectel() {
        let ports = ["ttyUSB10", "ttyUSB2", "ttyUSB0", "ttyUSB1"]
            .map(|name| format!("/dev/{name}"))
            .to_vec();
        let mut asked = Vec::new();

        let found = detect_port(ports, |device| {
            asked.push(device.to_owned());
            match device {
                "/dev/ttyUSB0" => Err(eyre!("busy")),
                "/dev/ttyUSB1" => Ok("\r\nOK\r\n".to_owned()),
                _ => Ok("Quectel\r\nRM520N-GL\r\nOK\r\n".to_owned()),
            }
        });

        assert_eq!(found.as_deref(), Some("/dev/ttyUSB2"));
        assert_eq!(asked, ["/dev/ttyUSB0", "/dev/ttyUSB1", "/dev/ttyUSB2"]);
    }

    #[test]
    fn no_port_answers() {
        let ports = vec!["/dev/ttyUSB0".to_owned()];
        assert_eq!(detect_port(ports, |_| Ok("OK".to_owned())), None);
        assert_eq!(detect_port(Vec::new(), |_| Ok("Quectel".to_owned())), None);
    }

    #[test]
    fn helper_gets_bus_and_command_as_arguments() {
        let mut helper =
            CommandTransport::new("echo", "1-1.2", Duration::from_secs(5));
        let response = helper.send("AT+QENG=\"servingcell\"").unwrap();
        assert_eq!(response, "-B 1-1.2 AT AT+QENG=\"servingcell\"\n");
    }

    #[test]
    fn failing_helper_without_output_is_an_error() {
        let mut helper =
            CommandTransport::new("false", "1-1.2", Duration::from_secs(5));
        assert!(helper.send("ATI").is_err());
    }

    #[test]
    fn missing_helper_is_an_error() {
        let mut helper = CommandTransport::new(
            "quectel-no-such-helper",
            "1-1.2",
            Duration::from_secs(5),
        );
        assert!(helper.send("ATI").is_err());
    }

    #[test]
    fn slow_helper_is_killed() {
        let child = Command::new("sleep")
            .arg("5")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let started = Instant::now();
        assert!(wait_with_timeout(child, Duration::from_millis(50)).is_err());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn timeout_without_data_is_an_error() {
        let mut port = FakePort::new(&[]);
        assert!(exchange(&mut port, "ATI", Duration::ZERO).is_err());
    }

    #[test]
    fn timeout_with_partial_data_returns_it() {
        let mut port = FakePort::new(&["Quectel\r\n"]);
        let response =
            exchange(&mut port, "ATI", Duration::from_millis(20)).unwrap();
        assert_eq!(response, "Quectel\r\n");
    }
}
