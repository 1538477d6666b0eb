//! Headless window service. Surfaces live in process memory and events are
//! injected through probes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{Address, Surface, TextBuffer, UiError, UiEvent, WindowService};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Slot {
    id: u64,
    buffer: Mutex<TextBuffer>,
    sender: Mutex<Option<Sender<UiEvent>>>,
    receiver: Mutex<Receiver<UiEvent>>,
    written_back: Mutex<Vec<UiEvent>>,
    closed: AtomicBool,
}

impl Slot {
    fn with_buffer<R>(&self, f: impl FnOnce(&mut TextBuffer) -> R) -> Result<R, UiError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(UiError::Closed);
        }
        Ok(f(&mut lock(&self.buffer)))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the sender ends the window's event stream
        lock(&self.sender).take();
    }
}

#[derive(Default)]
struct Registry {
    slots: Mutex<Vec<Arc<Slot>>>,
    next_id: AtomicU64,
}

/// In-process window service.
#[derive(Clone, Default)]
pub struct MemoryService {
    registry: Arc<Registry>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live surfaces in creation order
    pub fn surfaces(&self) -> Vec<SurfaceProbe> {
        lock(&self.registry.slots)
            .iter()
            .map(|slot| SurfaceProbe(slot.clone()))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<SurfaceProbe> {
        self.surfaces().into_iter().find(|probe| probe.name() == name)
    }

    /// Poll until a surface whose name starts with `prefix` exists
    pub fn wait_for(&self, prefix: &str, timeout: Duration) -> Option<SurfaceProbe> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(probe) = self
                .surfaces()
                .into_iter()
                .find(|probe| probe.name().starts_with(prefix))
            {
                return Some(probe);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.registry.slots).is_empty()
    }

    fn remove(&self, id: u64) {
        lock(&self.registry.slots).retain(|slot| slot.id != id);
    }
}

impl WindowService for MemoryService {
    fn create_surface(&self) -> Result<Box<dyn Surface>, UiError> {
        let (sender, receiver) = mpsc::channel();
        let slot = Arc::new(Slot {
            id: self.registry.next_id.fetch_add(1, Ordering::SeqCst),
            buffer: Mutex::new(TextBuffer::default()),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
            written_back: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        lock(&self.registry.slots).push(slot.clone());
        tracing::trace!(id = slot.id, "surface created");

        Ok(Box::new(MemorySurface {
            slot,
            service: self.clone(),
        }))
    }
}

struct MemorySurface {
    slot: Arc<Slot>,
    service: MemoryService,
}

impl Surface for MemorySurface {
    fn set_name(&self, name: &str) -> Result<(), UiError> {
        self.slot.with_buffer(|b| b.name = name.to_string())
    }

    fn set_tag(&self, tag: &str) -> Result<(), UiError> {
        self.slot.with_buffer(|b| b.tag = tag.to_string())
    }

    fn clear(&self) -> Result<(), UiError> {
        self.slot.with_buffer(TextBuffer::clear)
    }

    fn append(&self, text: &str) -> Result<(), UiError> {
        self.slot.with_buffer(|b| b.append(text))
    }

    fn set_selection(&self, address: Address) -> Result<(), UiError> {
        self.slot.with_buffer(|b| b.select(address))
    }

    fn line_at(&self, offset: usize) -> Result<(usize, String), UiError> {
        self.slot.with_buffer(|b| b.line_at(offset))
    }

    fn body(&self) -> Result<String, UiError> {
        self.slot.with_buffer(|b| b.body().to_string())
    }

    fn report(&self, diagnostic: &str) -> Result<(), UiError> {
        self.slot.with_buffer(|b| b.report(diagnostic))
    }

    fn mark_clean(&self) -> Result<(), UiError> {
        self.slot.with_buffer(TextBuffer::mark_clean)
    }

    fn next_event(&self) -> Option<UiEvent> {
        lock(&self.slot.receiver).recv().ok()
    }

    fn write_back(&self, event: UiEvent) -> Result<(), UiError> {
        if self.slot.closed.load(Ordering::SeqCst) {
            return Err(UiError::Closed);
        }
        lock(&self.slot.written_back).push(event);
        Ok(())
    }

    fn destroy(&self) {
        self.slot.close();
        self.service.remove(self.slot.id);
        tracing::trace!(id = self.slot.id, "surface destroyed");
    }
}

/// Outside view of a surface: what a user would see and do.
#[derive(Clone)]
pub struct SurfaceProbe(Arc<Slot>);

impl SurfaceProbe {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> String {
        lock(&self.0.buffer).name.clone()
    }

    pub fn tag(&self) -> String {
        lock(&self.0.buffer).tag.clone()
    }

    pub fn body(&self) -> String {
        lock(&self.0.buffer).body().to_string()
    }

    /// Copy of the whole buffer
    pub fn snapshot(&self) -> TextBuffer {
        lock(&self.0.buffer).clone()
    }

    pub fn selection(&self) -> (usize, usize) {
        lock(&self.0.buffer).selection()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        lock(&self.0.buffer).diagnostics().to_vec()
    }

    pub fn is_clean(&self) -> bool {
        !lock(&self.0.buffer).is_dirty()
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.load(Ordering::SeqCst)
    }

    /// Run `f` against the buffer as the user editing it
    pub fn edit<R>(&self, f: impl FnOnce(&mut TextBuffer) -> R) -> R {
        f(&mut lock(&self.0.buffer))
    }

    /// Deliver an event to the window; false once the surface is closed
    pub fn send(&self, event: UiEvent) -> bool {
        match lock(&self.0.sender).as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Events the window did not handle, oldest first
    pub fn take_written_back(&self) -> Vec<UiEvent> {
        std::mem::take(&mut *lock(&self.0.written_back))
    }

    pub fn close(&self) {
        self.0.close();
    }

    /// Poll until `check` holds for the buffer
    pub fn wait_until(&self, timeout: Duration, check: impl Fn(&TextBuffer) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if check(&lock(&self.0.buffer)) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Origin;

    #[test]
    fn test_surface_round_trip_through_probe() {
        let service = MemoryService::new();
        let surface = service.create_surface().unwrap();
        surface.set_name("/mail/test").unwrap();
        surface.set_tag("Redraw").unwrap();
        surface.append("one\ntwo\n").unwrap();

        let probe = service.find("/mail/test").unwrap();
        assert_eq!(probe.tag(), "Redraw");
        assert_eq!(probe.body(), "one\ntwo\n");
        assert!(!probe.is_clean());

        surface.mark_clean().unwrap();
        assert!(probe.is_clean());
        assert_eq!(surface.line_at(5).unwrap(), (2, "two".to_string()));
    }

    #[test]
    fn test_events_flow_until_close() {
        let service = MemoryService::new();
        let surface = service.create_surface().unwrap();
        let probe = service.surfaces().remove(0);

        assert!(probe.send(UiEvent::execute(Origin::Tag, "Redraw")));
        assert_eq!(surface.next_event().unwrap().text, "Redraw");

        probe.close();
        assert!(!probe.send(UiEvent::execute(Origin::Tag, "Redraw")));
        assert_eq!(surface.next_event(), None);
        assert!(matches!(surface.append("late"), Err(UiError::Closed)));
    }

    #[test]
    fn test_destroy_unregisters() {
        let service = MemoryService::new();
        let surface = service.create_surface().unwrap();
        assert!(!service.is_empty());
        surface.destroy();
        assert!(service.is_empty());
    }

    #[test]
    fn test_write_back_is_recorded() {
        let service = MemoryService::new();
        let surface = service.create_surface().unwrap();
        surface
            .write_back(UiEvent::execute(Origin::Tag, "Del"))
            .unwrap();
        let probe = service.surfaces().remove(0);
        let events = probe.take_written_back();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].command(), "Del");
        assert!(probe.take_written_back().is_empty());
    }
}
