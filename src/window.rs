use std::{cell::Cell, rc::Rc, time::Duration};

use anyhow::{Result, anyhow};
use minifb::{InputCallback, Window, WindowOptions};
use rayon::prelude::*;

use crate::{app::FrameSink, types::Frame};

pub const WINDOW_TITLE: &str = "Gesture Overlay";
/// How long each presented frame waits for keyboard input.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(1);
const QUIT_CHAR: char = 'q';

pub struct WindowSink {
    window: Window,
    buffer: Vec<u32>,
    quit_pressed: Rc<Cell<bool>>,
}

/// Latches a typed `q`. Character events are queued between updates, so a
/// tap during inference is not lost; `Q` (shifted) is ignored.
struct QuitKey(Rc<Cell<bool>>);

impl InputCallback for QuitKey {
    fn add_char(&mut self, uni_char: u32) {
        if char::from_u32(uni_char) == Some(QUIT_CHAR) {
            self.0.set(true);
        }
    }
}

impl WindowSink {
    pub fn open(width: u32, height: u32) -> Result<Self> {
        let mut window = Window::new(
            WINDOW_TITLE,
            width as usize,
            height as usize,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
        window.limit_update_rate(Some(INPUT_POLL_INTERVAL));

        let quit_pressed = Rc::new(Cell::new(false));
        window.set_input_callback(Box::new(QuitKey(quit_pressed.clone())));

        Ok(Self {
            window,
            buffer: Vec::new(),
            quit_pressed,
        })
    }
}

impl FrameSink for WindowSink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let (width, height) = frame.dimensions();
        pack_rgba(&frame.rgba, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, width as usize, height as usize)
            .map_err(|err| anyhow!("window update failed: {err}"))
    }

    fn quit_requested(&self) -> bool {
        !self.window.is_open() || self.quit_pressed.get()
    }
}

impl Drop for WindowSink {
    fn drop(&mut self) {
        log::info!("window closed");
    }
}

/// Packs RGBA bytes into minifb's `0RGB` words.
fn pack_rgba(rgba: &[u8], out: &mut Vec<u32>) {
    out.resize(rgba.len() / 4, 0);
    out.par_iter_mut()
        .zip(rgba.par_chunks_exact(4))
        .for_each(|(dst, px)| {
            *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
        });
}
