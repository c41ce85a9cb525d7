//! Drive models.
//!
//! A drive model is the drive's CPU plus its board: RAM, ROM, the IEC port
//! chip and the disk mechanics. The emulator steps it once per CPU cycle
//! and hands it the bus state so port writes can change what goes out on
//! the wire.

use commodore_iec::{GateModel, IecBusState, IecPort};
use emu_core::{Bus, Cpu, MasterClock};

use crate::image::SharedImage;

pub trait DriveModel {
    /// Power-on reset of CPU and chips.
    fn reset(&mut self, iec: &mut IecBusState);

    /// One CPU cycle.
    fn step(&mut self, iec: &mut IecBusState);

    fn sync(&self) -> bool;
    fn pc(&self) -> u16;
    fn a(&self) -> u8;

    /// Advance the disk mechanics by one cycle.
    fn update(&mut self);

    fn is_led_on(&self) -> bool;

    /// Changes whenever the head moves: last step direction on the 1541,
    /// current track on the 1581.
    fn head_position(&self) -> u32;

    fn insert(&mut self, image: SharedImage);
    fn disk_image(&self) -> Option<&SharedImage>;

    /// Hash of the loaded ROM.
    fn rom_hash(&self) -> u32;

    /// Choose the memory map for the next session.
    fn configure_bus(&mut self, _extra_ram: bool) {}

    fn set_device_id(&mut self, device_id: u8);

    /// The chip port wired to the IEC lines.
    fn port_mut(&mut self) -> &mut dyn IecPort;

    /// How this board's ATNA output gates DATA.
    fn gate(&self) -> GateModel;

    fn clock(&self) -> MasterClock;
}

/// Everything on a drive board except the CPU.
pub trait DriveHardware {
    /// CPU read. `iec` is available for port chips that sit on the bus.
    fn read(&mut self, address: u16, iec: &mut IecBusState) -> u8;

    /// CPU write. A write to the IEC port must end in
    /// [`IecBusState::port_b_on_port_out`].
    fn write(&mut self, address: u16, value: u8, iec: &mut IecBusState);

    fn reset(&mut self, iec: &mut IecBusState);
    fn update(&mut self);
    fn is_led_on(&self) -> bool;
    fn head_position(&self) -> u32;
    fn insert(&mut self, image: SharedImage);
    fn disk_image(&self) -> Option<&SharedImage>;
    fn rom_hash(&self) -> u32;
    fn set_extra_ram(&mut self, _enabled: bool) {}
    fn set_device_id(&mut self, device_id: u8);
    fn port_mut(&mut self) -> &mut dyn IecPort;
    fn gate(&self) -> GateModel;
    fn clock(&self) -> MasterClock;
}

/// The CPU's view of the board for the duration of one step.
pub struct WiredBus<'a, H> {
    hardware: &'a mut H,
    iec: &'a mut IecBusState,
}

impl<'a, H: DriveHardware> WiredBus<'a, H> {
    pub fn new(hardware: &'a mut H, iec: &'a mut IecBusState) -> Self {
        Self { hardware, iec }
    }
}

impl<H: DriveHardware> Bus for WiredBus<'_, H> {
    fn read(&mut self, address: u16) -> u8 {
        self.hardware.read(address, self.iec)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.hardware.write(address, value, self.iec);
    }
}

/// A [`DriveModel`] built from a CPU core and a board.
pub struct CpuDrive<C, H> {
    cpu: C,
    hardware: H,
}

impl<C: Cpu, H: DriveHardware> CpuDrive<C, H> {
    pub fn new(cpu: C, hardware: H) -> Self {
        Self { cpu, hardware }
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }
}

impl<C: Cpu, H: DriveHardware> DriveModel for CpuDrive<C, H> {
    fn reset(&mut self, iec: &mut IecBusState) {
        self.hardware.reset(iec);
        self.cpu.reset();
    }

    fn step(&mut self, iec: &mut IecBusState) {
        let mut bus = WiredBus::new(&mut self.hardware, iec);
        self.cpu.step(&mut bus);
    }

    fn sync(&self) -> bool {
        self.cpu.sync()
    }

    fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    fn a(&self) -> u8 {
        self.cpu.a()
    }

    fn update(&mut self) {
        self.hardware.update();
    }

    fn is_led_on(&self) -> bool {
        self.hardware.is_led_on()
    }

    fn head_position(&self) -> u32 {
        self.hardware.head_position()
    }

    fn insert(&mut self, image: SharedImage) {
        self.hardware.insert(image);
    }

    fn disk_image(&self) -> Option<&SharedImage> {
        self.hardware.disk_image()
    }

    fn rom_hash(&self) -> u32 {
        self.hardware.rom_hash()
    }

    fn configure_bus(&mut self, extra_ram: bool) {
        self.hardware.set_extra_ram(extra_ram);
    }

    fn set_device_id(&mut self, device_id: u8) {
        self.hardware.set_device_id(device_id);
    }

    fn port_mut(&mut self) -> &mut dyn IecPort {
        self.hardware.port_mut()
    }

    fn gate(&self) -> GateModel {
        self.hardware.gate()
    }

    fn clock(&self) -> MasterClock {
        self.hardware.clock()
    }
}
