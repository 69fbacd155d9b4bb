//! Behavioural model of the VGA tile: a 640x480@60 timing generator driven
//! by a 25 MHz pixel clock, with the Tiny VGA PMOD pinout on `uo_out`.

use bitvec::vec::BitVec;
use ttvga_rs::Signal;
use ttvga_sim::bits;

use crate::{
    backend::Backend,
    error::{Error, TtvgaLocalSimResult},
};

pub const H_VISIBLE: u64 = 640;
pub const H_SYNC_START: u64 = 656;
pub const H_SYNC_END: u64 = 752;
pub const H_TOTAL: u64 = 800;
pub const V_VISIBLE: u64 = 480;
pub const V_SYNC_START: u64 = 490;
pub const V_SYNC_END: u64 = 492;
pub const V_TOTAL: u64 = 525;

/// Bidirectional pins 0, 1, 3 and 4 are outputs.
pub const UIO_OE: u8 = 0b0001_1011;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetPolarity {
    /// `reset` input, asserted high.
    ActiveHigh,
    /// `rst_n` input, asserted low.
    ActiveLow,
}

impl ResetPolarity {
    pub fn pin_name(self) -> &'static str {
        match self {
            ResetPolarity::ActiveHigh => "reset",
            ResetPolarity::ActiveLow => "rst_n",
        }
    }

    pub fn asserted_level(self) -> u64 {
        match self {
            ResetPolarity::ActiveHigh => 1,
            ResetPolarity::ActiveLow => 0,
        }
    }

    pub fn released_level(self) -> u64 {
        1 - self.asserted_level()
    }

    fn is_asserted(self, level: bool) -> bool {
        level == (self.asserted_level() == 1)
    }
}

/// Replaces `uio_oe` with `value` once `after_cycles` clock cycles have
/// elapsed since the last reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UioOeFault {
    pub after_cycles: u64,
    pub value: u8,
}

pub struct VgaTile {
    polarity: ResetPolarity,
    time: u64,
    clk: bool,
    last_clk: bool,
    reset_level: bool,
    /// Held for the tile interface; the raster runs regardless of `ena`,
    /// `ui_in` and `uio_in`.
    ena: bool,
    test_in: bool,
    ui_in: u8,
    uio_in: u8,
    h_count: u64,
    v_count: u64,
    cycles_since_reset: Option<u64>,
    uio_oe: u8,
    fault: Option<UioOeFault>,
}

impl VgaTile {
    pub fn new(polarity: ResetPolarity) -> Self {
        Self {
            polarity,
            time: 0,
            clk: false,
            last_clk: false,
            reset_level: polarity.released_level() == 1,
            ena: false,
            test_in: false,
            ui_in: 0,
            uio_in: 0,
            h_count: 0,
            v_count: 0,
            cycles_since_reset: None,
            uio_oe: UIO_OE,
            fault: None,
        }
    }

    pub fn with_uio_oe(mut self, uio_oe: u8) -> Self {
        self.uio_oe = uio_oe;
        self
    }

    pub fn with_fault(mut self, fault: UioOeFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn polarity(&self) -> ResetPolarity {
        self.polarity
    }

    pub fn signals(&self) -> Vec<Signal> {
        vec![
            Signal::input("clk", 1),
            Signal::input(self.polarity.pin_name(), 1),
            Signal::input("ena", 1),
            Signal::input("Test_in", 1),
            Signal::input("ui_in", 8),
            Signal::input("uio_in", 8),
            Signal::output("uo_out", 8),
            Signal::output("uio_out", 8),
            Signal::output("uio_oe", 8),
            Signal::output("h_count", 10),
            Signal::output("v_count", 10),
        ]
    }

    fn evaluate(&mut self) {
        if self.clk && !self.last_clk {
            self.on_rising_edge();
        }
        self.last_clk = self.clk;
    }

    fn on_rising_edge(&mut self) {
        if self.polarity.is_asserted(self.reset_level) {
            self.h_count = 0;
            self.v_count = 0;
            self.cycles_since_reset = Some(0);
            return;
        }
        self.h_count += 1;
        if self.h_count == H_TOTAL {
            self.h_count = 0;
            self.v_count = (self.v_count + 1) % V_TOTAL;
        }
        if let Some(cycles) = self.cycles_since_reset.as_mut() {
            *cycles += 1;
        }
    }

    fn visible(&self) -> bool {
        self.h_count < H_VISIBLE && self.v_count < V_VISIBLE
    }

    fn hsync(&self) -> bool {
        !(H_SYNC_START..H_SYNC_END).contains(&self.h_count)
    }

    fn vsync(&self) -> bool {
        !(V_SYNC_START..V_SYNC_END).contains(&self.v_count)
    }

    /// Two bits per channel. `Test_in` selects eight colour bars.
    fn rgb(&self) -> (u8, u8, u8) {
        if !self.visible() {
            return (0, 0, 0);
        }
        let (h, v) = (self.h_count, self.v_count);
        if self.test_in {
            let bar = h / (H_VISIBLE / 8);
            let level = |bit: u64| if bar & bit != 0 { 0b11 } else { 0b00 };
            (level(1), level(2), level(4))
        } else {
            let r = (h >> 4) & 0b11;
            let g = (v >> 4) & 0b11;
            let b = ((h + v) >> 5) & 0b11;
            (r as u8, g as u8, b as u8)
        }
    }

    /// `{hsync, B0, G0, R0, vsync, B1, G1, R1}`, MSB first.
    fn uo_out(&self) -> u8 {
        let (r, g, b) = self.rgb();
        let bit = |value: u8, shift: u8| (value & 1) << shift;
        bit(r >> 1, 0)
            | bit(g >> 1, 1)
            | bit(b >> 1, 2)
            | bit(self.vsync() as u8, 3)
            | bit(r, 4)
            | bit(g, 5)
            | bit(b, 6)
            | bit(self.hsync() as u8, 7)
    }

    fn uio_out(&self) -> u8 {
        let frame_start = self.h_count == 0 && self.v_count == 0;
        (self.visible() as u8)
            | (frame_start as u8) << 1
            | (self.hsync() as u8) << 3
            | (self.vsync() as u8) << 4
    }

    fn uio_oe(&self) -> u8 {
        match (self.fault, self.cycles_since_reset) {
            (Some(fault), Some(cycles)) if cycles >= fault.after_cycles => fault.value,
            _ => self.uio_oe,
        }
    }

    fn input_u8(signal_name: &str, value: &BitVec<u32>, width: usize) -> TtvgaLocalSimResult<u8> {
        bits::fit_to_width(value, width)
            .and_then(|fitted| bits::to_u64(&fitted))
            .map(|v| v as u8)
            .ok_or_else(|| {
                Error::ValueTooWide(signal_name.to_string(), bits::binary(value), width)
            })
    }
}

impl Backend for VgaTile {
    fn query(&self) -> TtvgaLocalSimResult<Vec<Signal>> {
        Ok(self.signals())
    }

    fn set(&mut self, signal_name: &str, value: &BitVec<u32>) -> TtvgaLocalSimResult<()> {
        match signal_name {
            "clk" => self.clk = Self::input_u8(signal_name, value, 1)? == 1,
            "ena" => self.ena = Self::input_u8(signal_name, value, 1)? == 1,
            "Test_in" => self.test_in = Self::input_u8(signal_name, value, 1)? == 1,
            "ui_in" => self.ui_in = Self::input_u8(signal_name, value, 8)?,
            "uio_in" => self.uio_in = Self::input_u8(signal_name, value, 8)?,
            name if name == self.polarity.pin_name() => {
                self.reset_level = Self::input_u8(signal_name, value, 1)? == 1
            }
            "uo_out" | "uio_out" | "uio_oe" | "h_count" | "v_count" => {
                return Err(Error::NotSettable(signal_name.to_string()))
            }
            _ => return Err(Error::UnknownSignal(signal_name.to_string())),
        }
        Ok(())
    }

    fn get(&self, signal_name: &str) -> TtvgaLocalSimResult<BitVec<u32>> {
        let (value, width) = match signal_name {
            "clk" => (self.clk as u64, 1),
            "ena" => (self.ena as u64, 1),
            "Test_in" => (self.test_in as u64, 1),
            "ui_in" => (self.ui_in as u64, 8),
            "uio_in" => (self.uio_in as u64, 8),
            "uo_out" => (self.uo_out() as u64, 8),
            "uio_out" => (self.uio_out() as u64, 8),
            "uio_oe" => (self.uio_oe() as u64, 8),
            "h_count" => (self.h_count, 10),
            "v_count" => (self.v_count, 10),
            name if name == self.polarity.pin_name() => (self.reset_level as u64, 1),
            _ => return Err(Error::UnknownSignal(signal_name.to_string())),
        };
        Ok(bits::from_u64(value, width))
    }

    fn run(&mut self, duration: u64) -> TtvgaLocalSimResult<u64> {
        self.time = self
            .time
            .checked_add(duration)
            .ok_or(Error::TimeOverflow(self.time, duration))?;
        self.evaluate();
        Ok(self.time)
    }
}

#[cfg(test)]
mod test {
    use ttvga_sim::bits;

    use super::*;

    fn set(tile: &mut VgaTile, name: &str, value: u64) {
        tile.set(name, &bits::from_u64(value, 1)).unwrap();
        tile.run(0).unwrap();
    }

    fn get(tile: &VgaTile, name: &str) -> u64 {
        bits::to_u64(&tile.get(name).unwrap()).unwrap()
    }

    fn tick(tile: &mut VgaTile, cycles: u64) {
        for _ in 0..cycles {
            set(tile, "clk", 0);
            set(tile, "clk", 1);
        }
    }

    fn reset(tile: &mut VgaTile) {
        let polarity = tile.polarity();
        set(tile, polarity.pin_name(), polarity.asserted_level());
        tick(tile, 2);
        set(tile, polarity.pin_name(), polarity.released_level());
    }

    #[test]
    fn test_counters_wrap_per_line_and_frame() {
        let mut tile = VgaTile::new(ResetPolarity::ActiveLow);
        reset(&mut tile);
        tick(&mut tile, H_TOTAL - 1);
        assert_eq!(get(&tile, "h_count"), H_TOTAL - 1);
        tick(&mut tile, 1);
        assert_eq!(get(&tile, "h_count"), 0);
        assert_eq!(get(&tile, "v_count"), 1);
        tick(&mut tile, H_TOTAL * (V_TOTAL - 1));
        assert_eq!(get(&tile, "v_count"), 0);
        assert_eq!(get(&tile, "uio_out") & 0b10, 0b10);
    }

    #[test]
    fn test_hsync_pulse() {
        let mut tile = VgaTile::new(ResetPolarity::ActiveHigh);
        reset(&mut tile);
        tick(&mut tile, H_SYNC_START - 1);
        assert_eq!(get(&tile, "uo_out") >> 7, 1);
        tick(&mut tile, 1);
        assert_eq!(get(&tile, "uo_out") >> 7, 0);
        assert_eq!(get(&tile, "uio_out") & 0b1000, 0);
        tick(&mut tile, H_SYNC_END - H_SYNC_START);
        assert_eq!(get(&tile, "uo_out") >> 7, 1);
    }

    #[test]
    fn test_reset_holds_counters() {
        let mut tile = VgaTile::new(ResetPolarity::ActiveHigh);
        tick(&mut tile, 10);
        assert_eq!(get(&tile, "h_count"), 10);
        set(&mut tile, "reset", 1);
        tick(&mut tile, 5);
        assert_eq!(get(&tile, "h_count"), 0);
    }

    #[test]
    fn test_colour_bars() {
        let mut tile = VgaTile::new(ResetPolarity::ActiveLow);
        reset(&mut tile);
        set(&mut tile, "Test_in", 1);
        tick(&mut tile, 7 * 80);
        let uo_out = get(&tile, "uo_out");
        assert_eq!(uo_out & 0b0111_0111, 0b0111_0111);
    }

    #[test]
    fn test_uio_oe_constant_and_fault() {
        let mut tile = VgaTile::new(ResetPolarity::ActiveLow).with_fault(UioOeFault {
            after_cycles: 4,
            value: 0xFF,
        });
        assert_eq!(get(&tile, "uio_oe"), UIO_OE as u64);
        reset(&mut tile);
        tick(&mut tile, 3);
        assert_eq!(get(&tile, "uio_oe"), UIO_OE as u64);
        tick(&mut tile, 1);
        assert_eq!(get(&tile, "uio_oe"), 0xFF);
    }

    #[test]
    fn test_raster_ignores_enable_and_inputs() {
        let mut enabled = VgaTile::new(ResetPolarity::ActiveLow);
        set(&mut enabled, "ena", 1);
        let mut disabled = VgaTile::new(ResetPolarity::ActiveLow);
        set(&mut disabled, "ena", 0);
        disabled.set("ui_in", &bits::from_u64(0xAA, 8)).unwrap();
        disabled.set("uio_in", &bits::from_u64(0x55, 8)).unwrap();

        for tile in [&mut enabled, &mut disabled] {
            reset(tile);
            tick(tile, H_SYNC_START + 3);
        }
        for name in ["h_count", "v_count", "uo_out", "uio_out", "uio_oe"] {
            assert_eq!(get(&enabled, name), get(&disabled, name), "{name}");
        }
        assert_eq!(get(&disabled, "h_count"), H_SYNC_START + 3);
    }

    #[test]
    fn test_rejects_unknown_and_output_pins() {
        let mut tile = VgaTile::new(ResetPolarity::ActiveHigh);
        let one = bits::from_u64(1, 1);
        assert!(matches!(tile.set("rst_n", &one), Err(Error::UnknownSignal(_))));
        assert!(matches!(tile.set("uio_oe", &one), Err(Error::NotSettable(_))));
        assert!(matches!(
            tile.set("clk", &bits::from_u64(2, 2)),
            Err(Error::ValueTooWide(..))
        ));
        assert!(matches!(tile.get("nope"), Err(Error::UnknownSignal(_))));
    }

    #[test]
    fn test_run_past_end_of_time() {
        let mut tile = VgaTile::new(ResetPolarity::ActiveHigh);
        assert_eq!(tile.run(10).unwrap(), 10);
        assert!(matches!(tile.run(u64::MAX), Err(Error::TimeOverflow(10, u64::MAX))));
        assert_eq!(tile.run(0).unwrap(), 10);
    }
}
