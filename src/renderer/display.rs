use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    style::Print,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use std::io::{BufWriter, IsTerminal, Stdout, Write};
use std::time::{Duration, Instant};

use super::cell::GridSize;
use super::terminal::{KeyInput, Terminal, TerminalCaps};
use crate::error::Result;
use crate::shared::constants;

// Modes switched on entry, besides raw mode, the alternate screen and the
// hidden cursor: autowrap (DECAWM) off so the bottom-right cell never scrolls.
const ENTER_SEQUENCE: &str = "\x1b[?7l";

// Sequences undone by `restore_mode`, in the order they are sent:
// reset all palette registers (OSC 104), reset SGR, end synchronized update,
// re-enable autowrap (DECAWM).
const RESTORE_SEQUENCE: &str = "\x1b]104\x1b\\\x1b[0m\x1b[?2026l\x1b[?7h";

// Helper for zero-allocation integer writing
#[inline(always)]
fn write_u16_fast(buffer: &mut Vec<u8>, n: u16) {
    let mut digits = [0u8; 5];
    let mut len = 0;
    let mut n = n;
    loop {
        digits[len] = b'0' + (n % 10) as u8;
        len += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    buffer.extend(digits[..len].iter().rev());
}

#[inline(always)]
fn write_hex4(buffer: &mut Vec<u8>, n: u16) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    for shift in [12, 8, 4, 0] {
        buffer.push(HEX[((n >> shift) & 0xf) as usize]);
    }
}

fn style_bytes(register: u8) -> Vec<u8> {
    // Foreground: reserved register, background: the data register.
    let mut bytes = Vec::with_capacity(20);
    bytes.extend_from_slice(b"\x1b[38;5;");
    write_u16_fast(&mut bytes, constants::RESERVED_REGISTER as u16);
    bytes.extend_from_slice(b";48;5;");
    write_u16_fast(&mut bytes, register as u16);
    bytes.push(b'm');
    bytes
}

/// Crossterm-backed terminal. Palette registers are programmed with OSC 4 and
/// cells are painted with 256-color SGR backgrounds.
pub struct TerminalDisplay<W: Write = Stdout> {
    stdout: BufWriter<W>,
    caps: TerminalCaps,
    render_buffer: Vec<u8>,
    styles: Vec<Option<Vec<u8>>>,
    active_style: Option<u8>,
    cursor: Option<(u16, u16)>,
    frame_open: bool,
    raw: bool,
}

impl TerminalDisplay {
    /// Probe stdout. Whether the result is usable is decided by the render
    /// loop before the terminal mode is touched.
    pub fn new(max_colors: Option<u16>) -> Self {
        let caps = Self::detect_capabilities(max_colors);
        crate::utils::logger::info(&format!(
            "Terminal: palette={} colors={}",
            caps.programmable_palette, caps.colors
        ));
        Self::with_writer(BufWriter::with_capacity(1024 * 1024, std::io::stdout()), caps)
    }

    fn detect_capabilities(max_colors: Option<u16>) -> TerminalCaps {
        let term = std::env::var("TERM").unwrap_or_default();
        // The Linux console and dumb terminals ignore OSC 4.
        let programmable_palette =
            std::io::stdout().is_terminal() && !term.is_empty() && term != "dumb" && term != "linux";

        let mut colors = crossterm::style::available_color_count().min(constants::MAX_COLOR_REGISTERS);
        if let Some(cap) = max_colors {
            colors = colors.min(cap);
        }

        TerminalCaps {
            programmable_palette,
            colors,
            intensity_max: u16::MAX,
        }
    }
}

impl<W: Write> TerminalDisplay<W> {
    fn with_writer(stdout: BufWriter<W>, caps: TerminalCaps) -> Self {
        Self {
            stdout,
            caps,
            render_buffer: Vec::with_capacity(1024 * 1024),
            styles: vec![None; constants::MAX_COLOR_REGISTERS as usize],
            active_style: None,
            cursor: None,
            frame_open: false,
            raw: false,
        }
    }

    fn begin_frame(&mut self) {
        if !self.frame_open {
            // Synchronized update (DECSM 2026): the terminal shows the frame at once.
            self.render_buffer.extend_from_slice(b"\x1b[?2026h");
            self.frame_open = true;
        }
    }

    fn move_to(&mut self, row: u16, col: u16) {
        if self.cursor != Some((row, col)) {
            let buffer = &mut self.render_buffer;
            buffer.extend_from_slice(b"\x1b[");
            write_u16_fast(buffer, row + 1);
            buffer.push(b';');
            write_u16_fast(buffer, col + 1);
            buffer.push(b'H');
            self.cursor = Some((row, col));
        }
    }

    fn select_style(&mut self, register: u8) {
        if self.active_style == Some(register) {
            return;
        }
        let slot = &mut self.styles[register as usize];
        let bytes = slot.get_or_insert_with(|| style_bytes(register));
        self.render_buffer.extend_from_slice(bytes);
        self.active_style = Some(register);
    }
}

impl<W: Write> Terminal for TerminalDisplay<W> {
    fn capabilities(&self) -> TerminalCaps {
        self.caps
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.raw = true;
        self.stdout.execute(EnterAlternateScreen)?;
        self.stdout.execute(cursor::Hide)?;
        self.stdout.execute(Print(ENTER_SEQUENCE))?;

        Ok(())
    }

    fn restore_mode(&mut self) -> Result<()> {
        if !self.raw {
            return Ok(());
        }
        self.raw = false;
        self.render_buffer.clear();
        self.frame_open = false;
        self.active_style = None;
        self.cursor = None;

        // Run every step even if one fails, report the first failure.
        let steps = [
            self.stdout.execute(Print(RESTORE_SEQUENCE)).map(|_| ()),
            self.stdout.execute(cursor::Show).map(|_| ()),
            self.stdout.execute(LeaveAlternateScreen).map(|_| ()),
            terminal::disable_raw_mode(),
        ];
        for step in steps {
            step?;
        }
        Ok(())
    }

    fn grid_size(&mut self) -> Result<GridSize> {
        let (cols, rows) = terminal::size()?;
        Ok(GridSize::new(rows, cols))
    }

    fn set_palette_entry(&mut self, register: u8, r: u16, g: u16, b: u16) -> Result<()> {
        self.begin_frame();
        // OSC 4 ; register ; rgb:RRRR/GGGG/BBBB ST
        let buffer = &mut self.render_buffer;
        buffer.extend_from_slice(b"\x1b]4;");
        write_u16_fast(buffer, register as u16);
        buffer.extend_from_slice(b";rgb:");
        write_hex4(buffer, r);
        buffer.push(b'/');
        write_hex4(buffer, g);
        buffer.push(b'/');
        write_hex4(buffer, b);
        buffer.extend_from_slice(b"\x1b\\");
        Ok(())
    }

    fn bind_style(&mut self, register: u8) -> Result<()> {
        self.styles[register as usize] = Some(style_bytes(register));
        if self.active_style == Some(register) {
            self.active_style = None;
        }
        Ok(())
    }

    fn paint_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()> {
        self.begin_frame();
        self.move_to(row, col);
        self.select_style(register);
        self.render_buffer.push(b' ');
        self.cursor = Some((row, col + 1));
        Ok(())
    }

    fn insert_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()> {
        self.begin_frame();
        self.move_to(row, col);
        self.select_style(register);
        // ICH: inserts one blank in the current background, cursor stays put.
        self.render_buffer.extend_from_slice(b"\x1b[@");
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        if !self.frame_open {
            return Ok(());
        }
        self.render_buffer.extend_from_slice(b"\x1b[?2026l");
        self.frame_open = false;

        let start_io = Instant::now();
        self.stdout.write_all(&self.render_buffer)?;
        self.stdout.flush()?;
        let io_time = start_io.elapsed();

        if io_time.as_millis() > 10 {
            crate::utils::logger::debug(&format!(
                "Slow present: IO={}us | Bytes: {}",
                io_time.as_micros(),
                self.render_buffer.len()
            ));
        }

        self.render_buffer.clear();
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<KeyInput>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let input = match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        KeyInput::Interrupt
                    }
                    KeyCode::Char(c) => KeyInput::Char(c),
                    _ => KeyInput::Other,
                };
                return Ok(Some(input));
            }
        }
        Ok(None)
    }

    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<W: Write> Drop for TerminalDisplay<W> {
    fn drop(&mut self) {
        let _ = self.restore_mode();
    }
}

/// Best-effort restore used from the panic hook, where no display handle is
/// reachable. Callers check `terminal::session_active` first.
pub fn emergency_restore() {
    let mut stdout = std::io::stdout();
    let _ = stdout.execute(Print(RESTORE_SEQUENCE));
    let _ = stdout.execute(cursor::Show);
    let _ = stdout.execute(LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}
