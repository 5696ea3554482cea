use core::sync::atomic::{AtomicPtr, AtomicU64, AtomicUsize, Ordering};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;
use std::vec::Vec;

use strata_abi::arch::SegmentSelector;
use strata_abi::{IpiTarget, IrqError};

use super::*;

const SITE_FROM: u64 = 0xFFFF_FFFF_8010_0003;
const SITE_TO: u64 = 0xFFFF_FFFF_8010_0013;
const USER_CS: u64 = SegmentSelector::USER_CODE.bits() as u64;
const KERNEL_CS: u64 = SegmentSelector::KERNEL_CODE.bits() as u64;

#[derive(Default)]
struct FakePlatform {
    acks: AtomicUsize,
    cr2: AtomicU64,
}

impl Platform for FakePlatform {
    fn acknowledge_irq(&self) {
        self.acks.fetch_add(1, Ordering::SeqCst);
    }
    fn enable_line(&self, _line: u8) -> Result<(), IrqError> {
        Ok(())
    }
    fn disable_line(&self, _line: u8) -> Result<(), IrqError> {
        Ok(())
    }
    fn fault_address(&self) -> u64 {
        self.cr2.load(Ordering::SeqCst)
    }
    fn send_ipi(&self, _target: IpiTarget, _vector: u8) {}
    fn halt_cpu(&self) -> ! {
        panic!("cpu halted")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Call {
    PageFault(u64, PageFaultError),
    TaskSwitch,
    TaskExit(ExitStatus),
    Syscall(SyscallArgs),
    Irq(u8),
    DebugConsole,
}

/// Records every call together with whether CPU 0 held the kernel lock.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(Call, bool)>>,
    lock: AtomicPtr<KernelLock>,
}

impl Recorder {
    fn record(&self, call: Call) {
        let lock = self.lock.load(Ordering::SeqCst);
        // SAFETY: points at the dispatcher's lock, which outlives the test.
        let held = unsafe { lock.as_ref() }.is_some_and(|lock| lock.is_held_by(0));
        self.calls.lock().unwrap().push((call, held));
    }

    fn calls(&self) -> Vec<(Call, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

impl KernelServices for Recorder {
    fn handle_page_fault(&self, addr: u64, fault: PageFaultError) {
        self.record(Call::PageFault(addr, fault));
    }
    fn task_switch(&self) {
        self.record(Call::TaskSwitch);
    }
    fn task_exit(&self, status: ExitStatus) {
        self.record(Call::TaskExit(status));
    }
    fn handle_syscall(&self, args: SyscallArgs) -> u64 {
        self.record(Call::Syscall(args));
        args.kind * 100 + args.args[0]
    }
    fn handle_irq(&self, line: u8) {
        self.record(Call::Irq(line));
    }
    fn handle_debug_console_irq(&self) {
        self.record(Call::DebugConsole);
    }
}

type Dispatcher = TrapDispatcher<FakePlatform, Recorder>;

fn dispatcher() -> std::boxed::Box<Dispatcher> {
    let config = TrapConfig {
        irq_base: IRQ_BASE_VECTOR,
        debug_console_line: Some(4),
        sites: FaultSites::new(SITE_FROM, SITE_TO),
    };
    let d = std::boxed::Box::new(TrapDispatcher::new(
        FakePlatform::default(),
        Recorder::default(),
        config,
    ));
    d.services()
        .lock
        .store(d.lock() as *const KernelLock as *mut KernelLock, Ordering::SeqCst);
    d
}

fn frame(vector: u8, cs: u64) -> TrapFrame {
    TrapFrame {
        vector: vector as u64,
        cs,
        rip: 0x40_1234,
        ..TrapFrame::default()
    }
}

fn acks(d: &Dispatcher) -> usize {
    d.platform().acks.load(Ordering::SeqCst)
}

#[test]
fn user_page_fault_runs_under_the_lock() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    d.platform().cr2.store(0x40_8000, Ordering::SeqCst);
    let mut f = frame(14, USER_CS);
    f.error_code = (PageFaultError::USER | PageFaultError::WRITE).bits();

    assert_eq!(d.dispatch(&cpu, &mut f), TrapOutcome::ResumeUser);
    assert_eq!(
        d.services().calls(),
        [(Call::PageFault(0x40_8000, PageFaultError::USER | PageFaultError::WRITE), true)]
    );
    assert!(!d.lock().is_locked());
    assert_eq!(acks(&d), 1);
}

#[test]
fn usercopy_fault_keeps_the_callers_lock() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    d.platform().cr2.store(0x7000_0000, Ordering::SeqCst);
    let guard = d.lock().lock(0);
    cpu.set_usercopy_active(true);

    let mut f = frame(14, KERNEL_CS);
    f.rip = SITE_TO;
    f.error_code = PageFaultError::WRITE.bits();

    assert_eq!(d.dispatch(&cpu, &mut f), TrapOutcome::ResumeKernel);
    assert_eq!(
        d.services().calls(),
        [(Call::PageFault(0x7000_0000, PageFaultError::WRITE | PageFaultError::USER), true)]
    );
    assert!(d.lock().is_held_by(0));
    drop(guard);
    assert!(!d.lock().is_locked());
}

#[test]
#[should_panic(expected = "user-copy fault on cpu 0 outside a locked copy")]
fn usercopy_fault_without_the_lock_is_fatal() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    let mut f = frame(14, KERNEL_CS);
    f.rip = SITE_FROM;
    d.dispatch(&cpu, &mut f);
}

#[test]
#[should_panic(expected = "RSVD bit violation")]
fn reserved_bit_fault_is_fatal_even_from_user() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    let mut f = frame(14, USER_CS);
    f.error_code = (PageFaultError::USER | PageFaultError::RESERVED_WRITE).bits();
    d.dispatch(&cpu, &mut f);
}

#[test]
#[should_panic(expected = "page fault in the kernel space (addr=0xdead000)")]
fn kernel_page_fault_is_fatal() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    d.platform().cr2.store(0xdead000, Ordering::SeqCst);
    let mut f = frame(14, KERNEL_CS);
    f.rip = SITE_FROM + 1;
    d.dispatch(&cpu, &mut f);
}

#[test]
fn user_exception_terminates_the_task() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    let mut f = frame(13, USER_CS);

    assert_eq!(d.dispatch(&cpu, &mut f), TrapOutcome::TaskTerminated);
    assert_eq!(
        d.services().calls(),
        [(Call::TaskExit(ExitStatus::InvalidOperation), true)]
    );
    assert!(!d.lock().is_locked());
}

#[test]
#[should_panic(expected = "Exception #6 occurred in the kernel space!")]
fn kernel_exception_is_fatal() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    d.dispatch(&cpu, &mut frame(6, KERNEL_CS));
}

#[test]
fn irq_lines_reach_their_handlers() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);

    assert_eq!(d.dispatch(&cpu, &mut frame(33, USER_CS)), TrapOutcome::ResumeUser);
    assert_eq!(d.dispatch(&cpu, &mut frame(36, KERNEL_CS)), TrapOutcome::ResumeKernel);
    assert_eq!(d.dispatch(&cpu, &mut frame(32 + 63, KERNEL_CS)), TrapOutcome::ResumeKernel);

    assert_eq!(
        d.services().calls(),
        [(Call::Irq(1), true), (Call::DebugConsole, true), (Call::Irq(63), true)]
    );
    assert!(!d.lock().is_locked());
    assert_eq!(acks(&d), 3);
}

#[test]
fn reschedule_ipi_switches_under_the_lock() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    assert_eq!(
        d.dispatch(&cpu, &mut frame(0xFC, USER_CS)),
        TrapOutcome::ResumeUser
    );
    assert_eq!(d.services().calls(), [(Call::TaskSwitch, true)]);
    assert!(!d.lock().is_locked());
}

#[test]
#[should_panic(expected = "Unexpected interrupt #96")]
fn vector_past_the_irq_block_is_fatal() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    d.dispatch(&cpu, &mut frame(96, KERNEL_CS));
}

#[test]
#[should_panic(expected = "Unexpected interrupt #21")]
fn reserved_exception_vector_is_fatal() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    d.dispatch(&cpu, &mut frame(21, USER_CS));
}

#[test]
fn halt_ipi_force_releases_the_lock() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    core::mem::forget(d.lock().lock(1));

    let result = catch_unwind(AssertUnwindSafe(|| {
        d.dispatch(&cpu, &mut frame(0xFE, KERNEL_CS));
    }));

    assert!(result.is_err());
    assert!(!d.lock().is_locked());
    assert_eq!(acks(&d), 0);
    assert!(d.services().calls().is_empty());
}

#[test]
fn syscall_returns_the_handlers_word_in_rax() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    let mut f = frame(0x80, USER_CS);
    f.rax = 3;
    f.rdi = 7;
    f.rsi = 8;
    f.rdx = 9;
    f.r10 = 10;
    f.r8 = 11;

    assert_eq!(d.dispatch(&cpu, &mut f), TrapOutcome::ResumeUser);
    assert_eq!(f.rax, 307);
    assert_eq!(
        d.services().calls(),
        [(Call::Syscall(SyscallArgs::new(3, [7, 8, 9, 10, 11])), true)]
    );
    assert!(!d.lock().is_locked());
    assert_eq!(acks(&d), 0);
}

#[test]
fn syscall_gate_forwards_verbatim() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    let args = SyscallArgs::new(u64::MAX / 1000, [u64::MAX / 1000, 0, 0, 0, 0]);
    let expected = args.kind * 100 + args.args[0];
    assert_eq!(d.syscall_gate(&cpu, args), expected);
    assert!(!d.lock().is_locked());
}

fn panic_message(result: std::thread::Result<()>) -> Option<std::string::String> {
    let payload = result.err()?;
    payload
        .downcast_ref::<std::string::String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| std::string::String::from(*s)))
}

#[test]
fn kernel_exception_under_the_lock_reports_the_exception() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    let guard = d.lock().lock(0);

    let result = catch_unwind(AssertUnwindSafe(|| {
        d.dispatch(&cpu, &mut frame(13, KERNEL_CS));
    }));

    assert_eq!(
        panic_message(result).as_deref(),
        Some("Exception #13 occurred in the kernel space!")
    );
    assert!(d.lock().is_held_by(0));
    assert!(d.services().calls().is_empty());
    drop(guard);
}

#[test]
fn unexpected_vector_under_the_lock_reports_the_vector() {
    let d = dispatcher();
    let cpu = CpuContext::new(0);
    let guard = d.lock().lock(0);

    let result = catch_unwind(AssertUnwindSafe(|| {
        d.dispatch(&cpu, &mut frame(0x90, KERNEL_CS));
    }));

    assert_eq!(
        panic_message(result).as_deref(),
        Some("Unexpected interrupt #144")
    );
    assert!(d.lock().is_held_by(0));
    drop(guard);
}
