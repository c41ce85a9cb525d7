//! One emulated drive: command mode, session setup and the real-time loop.

use std::fmt;
use std::sync::Arc;

use commodore_iec::{BUTTON_COUNT, GateModel, Gpio, IecBus, SharedBus};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use emu_core::{MasterClock, Observable, Ticks, Value};

use crate::caddy::{DiskCaddy, MAX_DIRECT_SELECT};
use crate::config::{EmulatorConfig, SoundMode};
use crate::drive::DriveModel;
use crate::fast_path::{CommandFastPath, UpdateAction};
use crate::host::{EmulatorEvent, HostRequest};
use crate::image::{FileInfo, ImageLoader, SharedImage, is_disk_image_name};
use crate::input::InputMappings;
use crate::platform::Platform;
use crate::quirks::needs_deferred_refresh;
use crate::snoop::{CdSnooper, EXIT_DELAY_CYCLES, SnoopTarget};

/// Consecutive ticks with RESET asserted before a session ends.
const RESET_TICKS_TO_EXIT: u32 = 10;

/// Wait after writing images back, so the card finishes before the next
/// session starts.
const WRITE_BACK_SETTLE_US: u32 = 2_000_000;

const EVENT_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatingMode {
    /// Serving the command fast path or the menu.
    IecCommands,
    Emulating1541,
    Emulating1581,
    EmulationShutdown,
}

impl EmulatingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IecCommands => "iec-commands",
            Self::Emulating1541 => "1541",
            Self::Emulating1581 => "1581",
            Self::EmulationShutdown => "shutdown",
        }
    }
}

impl fmt::Display for EmulatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an emulation session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitType {
    Unknown,
    /// The host held RESET.
    Reset,
    /// The host sent `CD:_`.
    Cd,
    /// Exit button or key, or a host request that needs command mode.
    Keyboard,
    Autoload,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmulatorStats {
    /// Real-time ticks run, across all sessions.
    pub ticks: Ticks,
    /// Microseconds by which ticks overran their period.
    pub lost_cycles: u64,
    pub sessions: u64,
}

/// The pieces that make up a drive besides the pins and the clock.
pub struct DriveParts<G: Gpio> {
    pub drive_1541: Box<dyn DriveModel>,
    pub drive_1581: Option<Box<dyn DriveModel>>,
    pub loader: Box<dyn ImageLoader>,
    pub fast_path: Box<dyn CommandFastPath<G>>,
}

/// Per-session bookkeeping of the real-time loop.
struct TickState {
    old_led: bool,
    old_head: u32,
    head_sound_counter: i64,
    head_sound_freq_counter: i64,
    reset_count: u32,
    exit_cycles_remaining: u32,
    images: usize,
}

impl TickState {
    fn new(old_head: u32, images: usize) -> Self {
        Self {
            old_led: false,
            old_head,
            head_sound_counter: 0,
            head_sound_freq_counter: 0,
            reset_count: 0,
            exit_cycles_remaining: 0,
            images,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Drive1541,
    Drive1581,
}

pub struct Emulator<G: Gpio, P: Platform> {
    config: EmulatorConfig,
    device_id: u8,
    mode: EmulatingMode,
    bus: IecBus<G>,
    platform: P,
    /// Taken out while a session runs.
    drive_1541: Option<Box<dyn DriveModel>>,
    drive_1581: Option<Box<dyn DriveModel>>,
    has_1581: bool,
    caddy: DiskCaddy,
    loader: Box<dyn ImageLoader>,
    fast_path: Box<dyn CommandFastPath<G>>,
    input: InputMappings,
    /// Image of the current session came in over IEC.
    selected_via_iec: bool,
    /// A request that ended a session, replayed in command mode.
    pending: Option<HostRequest>,
    requests_tx: Sender<HostRequest>,
    requests_rx: Receiver<HostRequest>,
    events_tx: Sender<EmulatorEvent>,
    events_rx: Receiver<EmulatorEvent>,
    stats: EmulatorStats,
}

impl<G: Gpio, P: Platform> Emulator<G, P> {
    /// A drive on a bus shared with another emulator. `shared` decides
    /// which of the two samples the pins.
    pub fn new(
        config: EmulatorConfig,
        gpio: G,
        platform: P,
        parts: DriveParts<G>,
        shared: Arc<SharedBus>,
    ) -> Self {
        let device_id = config.device_id;
        shared.set_primary(config.dual_drive_primary);
        let bus = IecBus::new(gpio, &config.iec, device_id, shared);
        let (requests_tx, requests_rx) = crossbeam_channel::unbounded();
        let (events_tx, events_rx) = crossbeam_channel::bounded(EVENT_QUEUE_DEPTH);
        let DriveParts {
            mut drive_1541,
            mut drive_1581,
            loader,
            mut fast_path,
        } = parts;

        drive_1541.set_device_id(device_id);
        if let Some(drive) = drive_1581.as_mut() {
            drive.set_device_id(device_id);
        }
        fast_path.set_device_id(device_id);

        log::debug!("drive {device_id}: created");
        Self {
            has_1581: drive_1581.is_some(),
            config,
            device_id,
            mode: EmulatingMode::IecCommands,
            bus,
            platform,
            drive_1541: Some(drive_1541),
            drive_1581,
            caddy: DiskCaddy::new(),
            loader,
            fast_path,
            input: InputMappings::new(),
            selected_via_iec: false,
            pending: None,
            requests_tx,
            requests_rx,
            events_tx,
            events_rx,
            stats: EmulatorStats::default(),
        }
    }

    /// A drive alone on its pins.
    pub fn single(config: EmulatorConfig, gpio: G, platform: P, parts: DriveParts<G>) -> Self {
        let shared = Arc::new(SharedBus::new(config.dual_drive_primary));
        Self::new(config, gpio, platform, parts, shared)
    }

    /// Handle for sending requests from the host side.
    #[must_use]
    pub fn requests(&self) -> Sender<HostRequest> {
        self.requests_tx.clone()
    }

    /// Handle for receiving notifications on the host side.
    #[must_use]
    pub fn events(&self) -> Receiver<EmulatorEvent> {
        self.events_rx.clone()
    }

    #[must_use]
    pub fn mode(&self) -> EmulatingMode {
        self.mode
    }

    #[must_use]
    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    #[must_use]
    pub fn caddy(&self) -> &DiskCaddy {
        &self.caddy
    }

    #[must_use]
    pub fn stats(&self) -> EmulatorStats {
        self.stats
    }

    #[must_use]
    pub fn bus(&self) -> &IecBus<G> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut IecBus<G> {
        &mut self.bus
    }

    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    #[must_use]
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    fn emit(&self, event: EmulatorEvent) {
        if let Err(TrySendError::Full(event)) = self.events_tx.try_send(event) {
            log::trace!("drive {}: event queue full, dropped {event:?}", self.device_id);
        }
    }

    fn set_mode(&mut self, mode: EmulatingMode) {
        if self.mode != mode {
            log::info!("drive {}: {} -> {}", self.device_id, self.mode, mode);
            self.mode = mode;
            self.emit(EmulatorEvent::ModeChanged {
                device: self.device_id,
                mode,
            });
        }
    }

    /// Change the bus address on every component.
    pub fn set_device_id(&mut self, device_id: u8) {
        let old = self.device_id;
        log::info!("drive {old}: device id now {device_id}");
        self.device_id = device_id;
        self.fast_path.set_device_id(device_id);
        for drive in [self.drive_1541.as_mut(), self.drive_1581.as_mut()]
            .into_iter()
            .flatten()
        {
            drive.set_device_id(device_id);
        }
        self.bus.set_device_id(device_id);
        self.emit(EmulatorEvent::DeviceIdChanged {
            old,
            new: device_id,
        });
    }

    /// Open `file` into the caddy. Failures are reported, not returned.
    pub fn mount(&mut self, file: &FileInfo) -> bool {
        let result = if file.is_list() {
            self.loader
                .read_list(file)
                .and_then(|files| self.caddy.insert_all(self.loader.as_mut(), &files))
                .map(|_| ())
        } else {
            self.caddy
                .insert(self.loader.as_mut(), file, file.read_only)
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!("drive {}: {err}", self.device_id);
                self.emit(EmulatorEvent::MountFailed {
                    device: self.device_id,
                    name: file.name.clone(),
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    /// Put the first caddy image into the matching drive model.
    pub fn begin_emulating(&mut self) -> EmulatingMode {
        let Some(image) = self.caddy.select_first_image() else {
            return self.mode;
        };

        let mode = if image.is_d81() && self.has_1581 {
            EmulatingMode::Emulating1581
        } else {
            if image.is_d81() {
                log::warn!(
                    "drive {}: no 1581 model, running {} on the 1541",
                    self.device_id,
                    image.name()
                );
            }
            EmulatingMode::Emulating1541
        };
        let slot = match mode {
            EmulatingMode::Emulating1581 => Slot::Drive1581,
            _ => Slot::Drive1541,
        };
        if let Some(drive) = self.slot_mut(slot) {
            drive.insert(Arc::clone(&image));
        }
        self.emit(EmulatorEvent::CaddyContents {
            device: self.device_id,
            names: self.caddy.names(),
            selected: self.caddy.selected(),
        });
        self.set_mode(mode);
        mode
    }

    fn slot_mut(&mut self, slot: Slot) -> Option<&mut Box<dyn DriveModel>> {
        match slot {
            Slot::Drive1541 => self.drive_1541.as_mut(),
            Slot::Drive1581 => self.drive_1581.as_mut(),
        }
    }

    fn take_drive(&mut self, slot: Slot) -> Option<Box<dyn DriveModel>> {
        match slot {
            Slot::Drive1541 => self.drive_1541.take(),
            Slot::Drive1581 => self.drive_1581.take(),
        }
    }

    fn put_drive(&mut self, slot: Slot, drive: Box<dyn DriveModel>) {
        match slot {
            Slot::Drive1541 => self.drive_1541 = Some(drive),
            Slot::Drive1581 => self.drive_1581 = Some(drive),
        }
    }

    /// Run the 1541 session until the host or the user ends it.
    pub fn emulate_1541(&mut self) -> ExitType {
        let Some(mut drive) = self.take_drive(Slot::Drive1541) else {
            return ExitType::Unknown;
        };
        let reason = self.run_1541(drive.as_mut());
        self.put_drive(Slot::Drive1541, drive);
        reason
    }

    /// Run the 1581 session until the host or the user ends it.
    pub fn emulate_1581(&mut self) -> ExitType {
        let Some(mut drive) = self.take_drive(Slot::Drive1581) else {
            return ExitType::Unknown;
        };
        let reason = self.run_1581(drive.as_mut());
        self.put_drive(Slot::Drive1581, drive);
        reason
    }

    fn prepare_session(&mut self, drive: &mut dyn DriveModel) -> TickState {
        self.input.reset();
        // Refresh every button before the round-robin starts.
        self.bus.read_browse_mode();

        drive.configure_bus(self.config.extra_ram);
        self.bus.set_gate(drive.gate());
        self.bus.reset();
        drive.reset(self.bus.state_mut());
        self.bus.let_srq_be_pulled_high();

        TickState::new(drive.head_position(), self.caddy.number_of_images())
    }

    fn run_1541(&mut self, drive: &mut dyn DriveModel) -> ExitType {
        let mut tick = self.prepare_session(drive);

        let hash = drive.disk_image().map_or(0, |image| image.hash());
        let refresh_after_step = !needs_deferred_refresh(hash);
        if !refresh_after_step {
            log::debug!(
                "drive {}: image {hash:#010x} refreshes outputs after the cycle boundary",
                self.device_id
            );
        }

        // Self test needs no outputs.
        for _ in 0..self.config.fast_boot_cycles {
            self.bus.read_emulation_mode_1541(drive.port_mut());
            drive.step(self.bus.state_mut());
            drive.update();
        }

        let mut snooper = CdSnooper::new(SnoopTarget::Drive1541 {
            rom_hash: drive.rom_hash(),
        });
        let session = self.bus.shared().enter_realtime(self.device_id);
        log::debug!("drive {}: running 1541", self.device_id);

        let mut exit_reason = ExitType::Unknown;
        while exit_reason == ExitType::Unknown {
            let before = self.platform.now_us();

            if refresh_after_step {
                self.bus.read_emulation_mode_1541(drive.port_mut());
            }
            if drive.sync() && snooper.on_sync(drive.pc(), drive.a()) {
                tick.exit_cycles_remaining = EXIT_DELAY_CYCLES;
            }
            if self.count_down_exit(&mut tick) {
                exit_reason = ExitType::Cd;
            }

            drive.step(self.bus.state_mut());

            if refresh_after_step {
                self.bus.refresh_outs_1541();
            }
            self.update_led(&mut tick, drive.is_led_on());
            self.check_head(&mut tick, drive.head_position());

            self.poll_inputs();
            drive.update();

            exit_reason = self.check_exit(&mut tick, exit_reason);

            self.wait_for_tick(before);

            if !refresh_after_step {
                self.bus.read_emulation_mode_1541(drive.port_mut());
                self.bus.refresh_outs_1541();
            }
            self.tick_head_sound(&mut tick);
            self.swap_disks(&tick, drive);
        }

        drop(session);
        exit_reason
    }

    fn run_1581(&mut self, drive: &mut dyn DriveModel) -> ExitType {
        let mut tick = self.prepare_session(drive);
        let steps = drive.clock().steps_per_tick();
        let mut snooper = CdSnooper::new(SnoopTarget::Drive1581);

        let session = self.bus.shared().enter_realtime(self.device_id);
        log::debug!("drive {}: running 1581", self.device_id);

        let mut exit_reason = ExitType::Unknown;
        while exit_reason == ExitType::Unknown {
            let before = self.platform.now_us();

            self.bus.read_emulation_mode_1581(drive.port_mut());
            for _ in 0..steps {
                if drive.sync() && snooper.on_sync(drive.pc(), drive.a()) {
                    tick.exit_cycles_remaining = EXIT_DELAY_CYCLES;
                }
                if self.count_down_exit(&mut tick) {
                    exit_reason = ExitType::Cd;
                }
                drive.step(self.bus.state_mut());
                drive.update();
            }

            self.bus.refresh_outs_1581();
            self.update_led(&mut tick, drive.is_led_on());
            self.check_head(&mut tick, drive.head_position());

            self.poll_inputs();
            exit_reason = self.check_exit(&mut tick, exit_reason);

            self.wait_for_tick(before);

            self.tick_head_sound(&mut tick);
            self.swap_disks(&tick, drive);
        }

        drop(session);
        exit_reason
    }

    /// Returns true on the cycle the `CD:_` delay runs out.
    fn count_down_exit(&mut self, tick: &mut TickState) -> bool {
        if tick.exit_cycles_remaining == 0 {
            return false;
        }
        tick.exit_cycles_remaining -= 1;
        if tick.exit_cycles_remaining == 0 {
            self.set_mode(EmulatingMode::IecCommands);
            return true;
        }
        false
    }

    fn update_led(&mut self, tick: &mut TickState, on: bool) {
        self.bus.state_mut().set_output_led(on);
        if on != tick.old_led {
            tick.old_led = on;
            self.platform.set_act_led(on);
            self.bus.refresh_out_led();
        }
    }

    fn check_head(&mut self, tick: &mut TickState, head: u32) {
        if head == tick.old_head {
            return;
        }
        tick.old_head = head;
        match self.config.head_sound {
            SoundMode::Gpio => {
                tick.head_sound_counter = i64::from(self.config.head_sound_duration);
                tick.head_sound_freq_counter = i64::from(self.config.head_sound_freq);
            }
            SoundMode::Dma => self.platform.play_sound_dma(),
            SoundMode::Off => {}
        }
    }

    fn tick_head_sound(&mut self, tick: &mut TickState) {
        if self.config.head_sound != SoundMode::Gpio || tick.head_sound_counter <= 0 {
            return;
        }
        tick.head_sound_freq_counter -= 1;
        if tick.head_sound_freq_counter > 0 {
            return;
        }
        let freq = i64::from(self.config.head_sound_freq);
        tick.head_sound_freq_counter = freq;
        tick.head_sound_counter -= freq * 8;
        let state = self.bus.state_mut();
        let on = tick.head_sound_counter > 0 && !state.output_sound();
        state.set_output_sound(on);
        self.bus.refresh_out_sound();
    }

    /// Buttons, keys and host requests.
    fn poll_inputs(&mut self) {
        self.bus.read_user_input_emulation();
        self.input.check_buttons_emulation_mode(self.bus.buttons());

        while let Ok(request) = self.requests_rx.try_recv() {
            match request {
                HostRequest::Key(key) => self.input.apply_key(key, self.caddy.number_of_images()),
                HostRequest::UploadFinished => self.input.request_auto_load(),
                HostRequest::Unmount => {
                    self.set_mode(EmulatingMode::IecCommands);
                    self.input.request_exit();
                }
                request @ (HostRequest::Mount(_)
                | HostRequest::MountList(_)
                | HostRequest::Shutdown) => {
                    self.pending = Some(request);
                    self.set_mode(EmulatingMode::IecCommands);
                    self.input.request_exit();
                }
            }
        }
    }

    /// Resets win over nothing, the exit key over a reset, autoload over
    /// both.
    fn check_exit(&mut self, tick: &mut TickState, current: ExitType) -> ExitType {
        let reset = self.bus.is_reset();
        if reset {
            tick.reset_count += 1;
        } else {
            tick.reset_count = 0;
        }
        let exit = self.input.exit();
        let auto_load = self.input.auto_load();

        let mut reason = current;
        if self.mode == EmulatingMode::IecCommands
            || tick.reset_count > RESET_TICKS_TO_EXIT
            || exit
            || auto_load
        {
            if reset {
                reason = ExitType::Reset;
            }
            if exit {
                reason = ExitType::Keyboard;
            }
            if auto_load {
                reason = ExitType::Autoload;
            }
        }
        reason
    }

    /// Spin until one tick has passed since `before`.
    fn wait_for_tick(&mut self, before: u32) {
        let period = MasterClock::DRIVE_1541.tick_period_us() as u32;
        let mut elapsed;
        loop {
            elapsed = self.platform.now_us().wrapping_sub(before);
            if elapsed >= period {
                break;
            }
            std::hint::spin_loop();
        }
        if elapsed > period {
            self.stats.lost_cycles += u64::from(elapsed - period);
            log::debug!(
                "drive {} lost cycles: cycle time = {elapsed}us",
                self.device_id
            );
        }
        self.stats.ticks += Ticks::new(1);
    }

    fn swap_disks(&mut self, tick: &TickState, drive: &mut dyn DriveModel) {
        let next = self.input.next_disk();
        let prev = self.input.prev_disk();
        let direct = self.input.take_direct_swaps();
        if tick.images <= 1 {
            return;
        }

        let image = if next {
            self.caddy.next_disk()
        } else if prev {
            self.caddy.prev_disk()
        } else {
            self.direct_swap_target(direct, tick.images, drive.disk_image())
                .and_then(|slot| self.caddy.select_image(slot))
        };

        if let Some(image) = image {
            let name = image.name().to_string();
            drive.insert(image);
            log::debug!("drive {}: swapped to {name}", self.device_id);
            self.emit(EmulatorEvent::DiskSwapped {
                device: self.device_id,
                index: self.caddy.selected(),
                name,
            });
        }
    }

    /// First requested slot holding an image other than the inserted one.
    fn direct_swap_target(
        &self,
        requested: u16,
        images: usize,
        inserted: Option<&SharedImage>,
    ) -> Option<usize> {
        (0..images.min(MAX_DIRECT_SELECT))
            .filter(|slot| requested & (1 << slot) != 0)
            .find(|&slot| {
                self.caddy
                    .image(slot)
                    .is_some_and(|image| !is_same_image(inserted, image))
            })
    }

    /// The outer loop: command mode, sessions, back to command mode, until
    /// shut down.
    pub fn run(&mut self) {
        let mut exit_reason = ExitType::Unknown;
        log::info!("drive {}: entering main loop", self.device_id);
        while self.mode != EmulatingMode::EmulationShutdown {
            match self.mode {
                EmulatingMode::IecCommands => self.run_commands(exit_reason),
                EmulatingMode::Emulating1541 | EmulatingMode::Emulating1581 => {
                    let via_iec = std::mem::take(&mut self.selected_via_iec);
                    exit_reason = if self.mode == EmulatingMode::Emulating1581 {
                        self.emulate_1581()
                    } else {
                        self.emulate_1541()
                    };
                    self.end_session(exit_reason, via_iec);
                }
                EmulatingMode::EmulationShutdown => {}
            }
        }
        if let Err(err) = self.caddy.empty() {
            log::warn!("drive {}: {err}", self.device_id);
        }
        log::info!("drive {}: shut down", self.device_id);
    }

    fn end_session(&mut self, reason: ExitType, via_iec: bool) {
        log::debug!("drive {} exited emulation: {reason:?}", self.device_id);
        self.stats.sessions += 1;

        match self.caddy.empty() {
            Ok(true) => self.platform.us_delay(WRITE_BACK_SETTLE_US),
            Ok(false) => {}
            Err(err) => log::warn!("drive {}: {err}", self.device_id),
        }
        self.bus.wait_until_reset_released();
        self.set_mode(EmulatingMode::IecCommands);

        if reason == ExitType::Reset && (self.config.on_reset_change_to_starting_folder || via_iec)
        {
            self.emit(EmulatorEvent::DisplayRoot {
                device: self.device_id,
            });
        }
        self.emit(EmulatorEvent::SessionEnded {
            device: self.device_id,
            reason,
            lost_cycles: self.stats.lost_cycles,
        });
    }

    /// Command mode until an image is mounted or the drive shuts down.
    fn run_commands(&mut self, exit_reason: ExitType) {
        self.bus.set_gate(GateModel::AndWithoutVia);
        self.bus.reset();
        self.bus.let_srq_be_pulled_high();
        self.platform.us_delay(100);

        self.selected_via_iec = false;
        self.input.reset();

        let fast_path = !self.config.disable_fast_path;
        if fast_path {
            self.fast_path.begin(&mut self.bus);
            self.check_auto_mount(exit_reason);
        }
        if let Some(request) = self.pending.take() {
            self.handle_request(request);
        }

        while self.mode == EmulatingMode::IecCommands {
            if fast_path {
                let action = self.fast_path.update(&mut self.bus);
                self.handle_update_action(action);
            } else {
                self.poll_browser();
            }
            while self.mode == EmulatingMode::IecCommands {
                let Ok(request) = self.requests_rx.try_recv() else {
                    break;
                };
                self.handle_request(request);
            }
            self.platform.us_delay(1);
        }
    }

    /// Button edges for the menu while nothing else reads them.
    fn poll_browser(&mut self) {
        if !self.bus.read_browse_mode() {
            return;
        }
        for button in 0..BUTTON_COUNT {
            let buttons = self.bus.buttons();
            if buttons.pressed(button) || buttons.repeating(button) {
                self.emit(EmulatorEvent::ButtonPressed {
                    device: self.device_id,
                    button,
                });
            }
        }
    }

    fn check_auto_mount(&mut self, reason: ExitType) {
        if !matches!(
            reason,
            ExitType::Unknown | ExitType::Reset | ExitType::Autoload
        ) {
            return;
        }
        let Some(name) = self.config.auto_mount_image.clone() else {
            return;
        };
        log::debug!("drive {}: auto-mounting {name}", self.device_id);
        if self.mount(&FileInfo::new(name)) {
            self.begin_emulating();
        }
    }

    fn handle_update_action(&mut self, action: UpdateAction) {
        let device = self.device_id;
        match action {
            UpdateAction::None => self.poll_browser(),
            UpdateAction::Reset => {
                if self.config.on_reset_change_to_starting_folder {
                    self.emit(EmulatorEvent::DisplayRoot { device });
                }
                self.bus.reset();
                self.fast_path.begin(&mut self.bus);
                self.check_auto_mount(ExitType::Unknown);
            }
            UpdateAction::ImageSelected(file) => {
                let mountable = file.is_list() || is_disk_image_name(&file.name);
                if mountable && self.mount(&file) {
                    self.begin_emulating();
                } else {
                    if mountable && !file.is_list() {
                        self.fast_path.mount_failed();
                    }
                    self.fast_path.reset();
                }
                self.selected_via_iec = true;
            }
            UpdateAction::DirPushed | UpdateAction::Refresh => {
                self.emit(EmulatorEvent::FolderChanged { device });
            }
            UpdateAction::PopDir => self.emit(EmulatorEvent::PopFolder { device }),
            UpdateAction::PopToRoot => self.emit(EmulatorEvent::DisplayRoot { device }),
            UpdateAction::DeviceIdChanged(id) => self.set_device_id(id),
            UpdateAction::DeviceSwitched => self.emit(EmulatorEvent::DeviceSwitched { device }),
        }
    }

    fn handle_request(&mut self, request: HostRequest) {
        match request {
            HostRequest::Mount(file) | HostRequest::MountList(file) => {
                if self.mount(&file) {
                    self.begin_emulating();
                }
            }
            HostRequest::Shutdown => self.set_mode(EmulatingMode::EmulationShutdown),
            HostRequest::Unmount | HostRequest::UploadFinished | HostRequest::Key(_) => {
                log::trace!("drive {}: ignored {request:?} in command mode", self.device_id);
            }
        }
    }
}

fn is_same_image(current: Option<&SharedImage>, candidate: &SharedImage) -> bool {
    current.is_some_and(|current| Arc::ptr_eq(current, candidate))
}

impl<G: Gpio, P: Platform> Observable for Emulator<G, P> {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "emulator.mode" => Some(self.mode.as_str().into()),
            "emulator.device" => Some(self.device_id.into()),
            "caddy.count" => Some((self.caddy.number_of_images() as u32).into()),
            "caddy.selected" => Some((self.caddy.selected() as u32).into()),
            "caddy.current" => self
                .caddy
                .current()
                .map(|image| Value::from(image.name())),
            "stats.ticks" => Some(self.stats.ticks.get().into()),
            "stats.lost_cycles" => Some(self.stats.lost_cycles.into()),
            "stats.sessions" => Some(self.stats.sessions.into()),
            _ if path.starts_with("iec.") => self.bus.query(path),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "emulator.mode",
            "emulator.device",
            "caddy.count",
            "caddy.selected",
            "caddy.current",
            "stats.ticks",
            "stats.lost_cycles",
            "stats.sessions",
            "iec.atn",
            "iec.data",
            "iec.clock",
            "iec.srq",
            "iec.reset",
            "iec.data_out",
            "iec.clock_out",
            "iec.atna_data_out",
            "iec.srq_out",
            "iec.led",
            "iec.levels",
            "iec.device",
        ]
    }
}
