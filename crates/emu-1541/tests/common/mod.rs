//! Fakes for driving a whole emulator from tests: GPIO bank, platform,
//! a scripted CPU on a fake drive board, images and the fast path.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use commodore_iec::{Gpio, GateModel, IecBus, IecBusState, IecPort, PortLatch, port_pins};
use crossbeam_channel::Sender;
use emu_1541::{
    CaddyError, CommandFastPath, CpuDrive, DiskImage, DriveHardware, DriveParts, Emulator,
    EmulatorConfig, FileInfo, HostRequest, ImageLoader, Platform, SharedImage, UpdateAction,
};
use emu_core::{Bus, Cpu, MasterClock, RamBus};

pub const RESET_PIN: u8 = 3;
pub const ATN_PIN: u8 = 2;
pub const SOUND_PIN: u8 = 13;

/// Drive board register that switches the LED (bit 3).
pub const LED_REGISTER: u16 = 0x1C00;
/// Drive board register that moves the head.
pub const HEAD_REGISTER: u16 = 0x1C01;
pub const IEC_PORT: u16 = 0x1800;

/// Shared record of GPIO and platform calls, in order.
pub type Trace = Rc<RefCell<Vec<&'static str>>>;

#[derive(Debug, Default)]
pub struct Bank {
    pub host_low: u32,
    pub outputs: u32,
    pub latch: u32,
    pub release_after: Option<(usize, u32)>,
    pub reads: usize,
    pub sound_toggles: usize,
}

pub struct FakeGpio {
    pub bank: Rc<RefCell<Bank>>,
    pub trace: Trace,
}

impl FakeGpio {
    pub fn handle(&self) -> Self {
        Self {
            bank: Rc::clone(&self.bank),
            trace: Rc::clone(&self.trace),
        }
    }

    pub fn pull_low(&self, pin: u8) {
        self.bank.borrow_mut().host_low |= 1 << pin;
    }

    /// Let go of `pin` after `reads` more samples.
    pub fn release_after(&self, pin: u8, reads: usize) {
        self.bank.borrow_mut().release_after = Some((reads, 1 << pin));
    }
}

impl Gpio for FakeGpio {
    fn read_levels(&mut self) -> u32 {
        self.trace.borrow_mut().push("read");
        let mut bank = self.bank.borrow_mut();
        bank.reads += 1;
        if let Some((remaining, mask)) = bank.release_after {
            if remaining == 0 {
                bank.host_low &= !mask;
                bank.release_after = None;
            } else {
                bank.release_after = Some((remaining - 1, mask));
            }
        }
        !(bank.host_low | bank.outputs)
    }

    fn set_modes(&mut self, inputs: u32, outputs: u32) {
        self.trace.borrow_mut().push("modes");
        let mut bank = self.bank.borrow_mut();
        bank.outputs = (bank.outputs & !inputs) | outputs;
    }

    fn write_levels(&mut self, set: u32, clear: u32) {
        self.trace.borrow_mut().push("write");
        let mut bank = self.bank.borrow_mut();
        let before = bank.latch & (1 << SOUND_PIN);
        bank.latch = (bank.latch & !clear) | set;
        if bank.latch & (1 << SOUND_PIN) != before {
            bank.sound_toggles += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct PlatformLog {
    pub act_led: Vec<bool>,
    pub delays: Vec<u32>,
    pub dma_sounds: usize,
}

/// Microsecond clock that advances by one on every read. Sends `Shutdown`
/// after the number of delays held in `shutdown_after_delays`.
pub struct FakePlatform {
    now: u32,
    pub log: Rc<RefCell<PlatformLog>>,
    pub trace: Trace,
    pub shutdown_after_delays: Rc<RefCell<Option<(usize, Sender<HostRequest>)>>>,
}

impl Platform for FakePlatform {
    fn now_us(&mut self) -> u32 {
        self.trace.borrow_mut().push("now");
        self.now = self.now.wrapping_add(1);
        self.now
    }

    fn set_act_led(&mut self, on: bool) {
        self.log.borrow_mut().act_led.push(on);
    }

    fn us_delay(&mut self, us: u32) {
        let delays = {
            let mut log = self.log.borrow_mut();
            log.delays.push(us);
            log.delays.len()
        };
        let mut slot = self.shutdown_after_delays.borrow_mut();
        if slot.as_ref().is_some_and(|(when, _)| delays >= *when) {
            if let Some((_, sender)) = slot.take() {
                sender.send(HostRequest::Shutdown).unwrap();
            }
        }
    }

    fn play_sound_dma(&mut self) {
        self.log.borrow_mut().dma_sounds += 1;
    }
}

/// One instruction of a scripted CPU.
#[derive(Debug, Clone, Copy)]
pub struct Op {
    pub pc: u16,
    pub a: u8,
    pub write: Option<(u16, u8)>,
}

impl Op {
    pub const fn at(pc: u16, a: u8) -> Self {
        Self { pc, a, write: None }
    }

    pub const fn write(address: u16, value: u8) -> Self {
        Self {
            pc: 0xC100,
            a: value,
            write: Some((address, value)),
        }
    }
}

/// Plays its ops one per cycle, always on an instruction boundary, then
/// stays on the last one.
pub struct ScriptCpu {
    program: Vec<Op>,
    index: usize,
}

impl ScriptCpu {
    pub fn new(program: Vec<Op>) -> Self {
        let program = if program.is_empty() {
            vec![Op::at(0xC000, 0)]
        } else {
            program
        };
        Self { program, index: 0 }
    }

    fn op(&self) -> Op {
        self.program[self.index]
    }
}

impl Cpu for ScriptCpu {
    fn step<B: Bus>(&mut self, bus: &mut B) {
        if let Some((address, value)) = self.op().write {
            bus.write(address, value);
        }
        self.index = (self.index + 1).min(self.program.len() - 1);
    }

    fn sync(&self) -> bool {
        true
    }

    fn pc(&self) -> u16 {
        self.op().pc
    }

    fn a(&self) -> u8 {
        self.op().a
    }

    fn reset(&mut self) {
        self.index = 0;
    }
}

/// What a fake board saw, for assertions after the emulator is done.
#[derive(Debug, Default)]
pub struct Probe {
    pub inserted: Vec<String>,
    pub resets: usize,
    pub updates: u64,
    pub port_writes: u64,
    pub device_id: u8,
    pub extra_ram: bool,
}

pub struct FakeBoard {
    ram: RamBus,
    port: PortLatch,
    led: bool,
    head: u32,
    image: Option<SharedImage>,
    rom_hash: u32,
    gate: GateModel,
    clock: MasterClock,
    pub probe: Rc<RefCell<Probe>>,
}

impl FakeBoard {
    pub fn drive_1541(probe: Rc<RefCell<Probe>>) -> Self {
        Self::new(GateModel::XorWithVia, MasterClock::DRIVE_1541, probe)
    }

    pub fn drive_1581(probe: Rc<RefCell<Probe>>) -> Self {
        Self::new(GateModel::AndWithoutVia, MasterClock::DRIVE_1581, probe)
    }

    fn new(gate: GateModel, clock: MasterClock, probe: Rc<RefCell<Probe>>) -> Self {
        Self {
            ram: RamBus::new(),
            port: PortLatch::with_direction(
                port_pins::DATA_OUT | port_pins::CLOCK_OUT | port_pins::ATNA_OUT,
            ),
            led: false,
            head: 0,
            image: None,
            rom_hash: 0x1234_5678,
            gate,
            clock,
            probe,
        }
    }
}

impl DriveHardware for FakeBoard {
    fn read(&mut self, address: u16, _iec: &mut IecBusState) -> u8 {
        if address == IEC_PORT {
            return self.port.inputs;
        }
        self.ram.read(address)
    }

    fn write(&mut self, address: u16, value: u8, iec: &mut IecBusState) {
        match address {
            IEC_PORT => {
                self.probe.borrow_mut().port_writes += 1;
                iec.port_b_on_port_out(value, self.port.direction());
            }
            LED_REGISTER => self.led = value & 0x08 != 0,
            HEAD_REGISTER => self.head = u32::from(value),
            _ => self.ram.write(address, value),
        }
    }

    fn reset(&mut self, iec: &mut IecBusState) {
        self.probe.borrow_mut().resets += 1;
        self.led = false;
        iec.port_b_on_port_out(0, self.port.direction());
    }

    fn update(&mut self) {
        self.probe.borrow_mut().updates += 1;
    }

    fn is_led_on(&self) -> bool {
        self.led
    }

    fn head_position(&self) -> u32 {
        self.head
    }

    fn insert(&mut self, image: SharedImage) {
        self.probe.borrow_mut().inserted.push(image.name().to_string());
        self.image = Some(image);
    }

    fn disk_image(&self) -> Option<&SharedImage> {
        self.image.as_ref()
    }

    fn rom_hash(&self) -> u32 {
        self.rom_hash
    }

    fn set_extra_ram(&mut self, enabled: bool) {
        self.probe.borrow_mut().extra_ram = enabled;
    }

    fn set_device_id(&mut self, device_id: u8) {
        self.probe.borrow_mut().device_id = device_id;
    }

    fn port_mut(&mut self) -> &mut dyn IecPort {
        &mut self.port
    }

    fn gate(&self) -> GateModel {
        self.gate
    }

    fn clock(&self) -> MasterClock {
        self.clock
    }
}

pub struct FakeImage {
    name: String,
    hash: u32,
    dirty: AtomicBool,
    pub flushed: AtomicBool,
}

impl DiskImage for FakeImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self) -> u32 {
        self.hash
    }

    fn is_d81(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".d81")
    }

    fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    fn flush(&self) -> Result<(), CaddyError> {
        self.dirty.store(false, Ordering::Relaxed);
        self.flushed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Opens any name except those starting with `bad`.
#[derive(Default)]
pub struct FakeLoader {
    pub hashes: HashMap<String, u32>,
    pub dirty: Vec<String>,
    pub lists: HashMap<String, Vec<FileInfo>>,
}

impl ImageLoader for FakeLoader {
    fn open(&mut self, file: &FileInfo, _read_only: bool) -> Result<SharedImage, CaddyError> {
        if file.name.starts_with("bad") {
            return Err(CaddyError::Open {
                name: file.name.clone(),
                reason: "unreadable".into(),
            });
        }
        Ok(Arc::new(FakeImage {
            name: file.name.clone(),
            hash: self.hashes.get(&file.name).copied().unwrap_or(0),
            dirty: AtomicBool::new(self.dirty.contains(&file.name)),
            flushed: AtomicBool::new(false),
        }))
    }

    fn read_list(&mut self, file: &FileInfo) -> Result<Vec<FileInfo>, CaddyError> {
        self.lists
            .get(&file.name)
            .cloned()
            .ok_or_else(|| CaddyError::Open {
                name: file.name.clone(),
                reason: "no such list".into(),
            })
    }
}

#[derive(Debug, Default)]
pub struct FastPathLog {
    pub begins: usize,
    pub resets: usize,
    pub mount_failed: usize,
    pub device_id: u8,
}

/// Replays scripted actions, then reports nothing. Sends `Shutdown` when
/// begun for the `shutdown_on_begin`-th time.
pub struct FakeFastPath {
    pub actions: VecDeque<UpdateAction>,
    pub log: Rc<RefCell<FastPathLog>>,
    pub shutdown_on_begin: Rc<RefCell<Option<(usize, Sender<HostRequest>)>>>,
    pub idle_updates: Rc<Cell<usize>>,
}

impl CommandFastPath<FakeGpio> for FakeFastPath {
    fn begin(&mut self, _bus: &mut IecBus<FakeGpio>) {
        let begins = {
            let mut log = self.log.borrow_mut();
            log.begins += 1;
            log.begins
        };
        if let Some((when, sender)) = self.shutdown_on_begin.borrow().as_ref() {
            if *when == begins {
                sender.send(HostRequest::Shutdown).unwrap();
            }
        }
    }

    fn update(&mut self, _bus: &mut IecBus<FakeGpio>) -> UpdateAction {
        self.actions.pop_front().unwrap_or_else(|| {
            self.idle_updates.set(self.idle_updates.get() + 1);
            UpdateAction::None
        })
    }

    fn reset(&mut self) {
        self.log.borrow_mut().resets += 1;
    }

    fn mount_failed(&mut self) {
        self.log.borrow_mut().mount_failed += 1;
    }

    fn device_id(&self) -> u8 {
        self.log.borrow().device_id
    }

    fn set_device_id(&mut self, device_id: u8) {
        self.log.borrow_mut().device_id = device_id;
    }
}

/// An emulator wired to fakes, plus handles on everything the fakes saw.
pub struct Rig {
    pub emulator: Emulator<FakeGpio, FakePlatform>,
    pub gpio: FakeGpio,
    pub platform: Rc<RefCell<PlatformLog>>,
    pub trace: Trace,
    pub drive_1541: Rc<RefCell<Probe>>,
    pub drive_1581: Rc<RefCell<Probe>>,
    pub fast_path: Rc<RefCell<FastPathLog>>,
}

pub struct RigBuilder {
    pub config: EmulatorConfig,
    pub program_1541: Vec<Op>,
    pub program_1581: Vec<Op>,
    pub with_1581: bool,
    pub loader: FakeLoader,
    pub actions: Vec<UpdateAction>,
    pub shutdown_on_begin: Option<usize>,
    pub shutdown_after_delays: Option<usize>,
}

impl RigBuilder {
    pub fn new() -> Self {
        Self {
            config: EmulatorConfig {
                fast_boot_cycles: 10,
                ..EmulatorConfig::default()
            },
            program_1541: Vec::new(),
            program_1581: Vec::new(),
            with_1581: true,
            loader: FakeLoader::default(),
            actions: Vec::new(),
            shutdown_on_begin: None,
            shutdown_after_delays: None,
        }
    }

    pub fn build(self) -> Rig {
        let _ = env_logger::builder().is_test(true).try_init();
        let trace: Trace = Rc::default();
        let gpio = FakeGpio {
            bank: Rc::default(),
            trace: Rc::clone(&trace),
        };
        let platform_log = Rc::new(RefCell::new(PlatformLog::default()));
        let delay_slot = Rc::new(RefCell::new(None));
        let platform = FakePlatform {
            now: 0,
            log: Rc::clone(&platform_log),
            trace: Rc::clone(&trace),
            shutdown_after_delays: Rc::clone(&delay_slot),
        };

        let probe_1541 = Rc::new(RefCell::new(Probe::default()));
        let probe_1581 = Rc::new(RefCell::new(Probe::default()));
        let drive_1541 = CpuDrive::new(
            ScriptCpu::new(self.program_1541),
            FakeBoard::drive_1541(Rc::clone(&probe_1541)),
        );
        let drive_1581 = self.with_1581.then(|| {
            Box::new(CpuDrive::new(
                ScriptCpu::new(self.program_1581),
                FakeBoard::drive_1581(Rc::clone(&probe_1581)),
            )) as Box<dyn emu_1541::DriveModel>
        });

        let fast_path_log = Rc::new(RefCell::new(FastPathLog::default()));
        let handle = gpio.handle();
        let shutdown_slot = Rc::new(RefCell::new(None));
        let parts_fast_path = FakeFastPath {
            actions: self.actions.into(),
            log: Rc::clone(&fast_path_log),
            shutdown_on_begin: Rc::clone(&shutdown_slot),
            idle_updates: Rc::default(),
        };
        let parts = DriveParts {
            drive_1541: Box::new(drive_1541),
            drive_1581,
            loader: Box::new(self.loader),
            fast_path: Box::new(parts_fast_path),
        };
        let emulator = Emulator::single(self.config, gpio, platform, parts);
        if let Some(when) = self.shutdown_on_begin {
            *shutdown_slot.borrow_mut() = Some((when, emulator.requests()));
        }
        if let Some(when) = self.shutdown_after_delays {
            *delay_slot.borrow_mut() = Some((when, emulator.requests()));
        }

        Rig {
            emulator,
            gpio: handle,
            platform: platform_log,
            trace,
            drive_1541: probe_1541,
            drive_1581: probe_1581,
            fast_path: fast_path_log,
        }
    }
}
