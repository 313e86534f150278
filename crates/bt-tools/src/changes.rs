use std::cell::RefCell;
use std::rc::Rc;

use bt_core::{ChangeObserver, OwnerId};

/// Records every blackboard change notification, in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeLog {
    pub owners: Vec<OwnerId>,
}

impl ChangeLog {
    pub fn count(&self) -> usize {
        self.owners.len()
    }

    pub fn count_for(&self, owner: OwnerId) -> usize {
        self.owners.iter().filter(|o| **o == owner).count()
    }
}

impl ChangeObserver for ChangeLog {
    fn blackboard_changed(&mut self, owner: OwnerId) {
        self.owners.push(owner);
    }
}

/// [`ChangeLog`] that can be attached to a blackboard and read afterwards.
///
/// Clones share the same log, so one handle goes to the blackboard and the
/// other stays with the editor view or test.
#[derive(Debug, Default, Clone)]
pub struct SharedChangeLog(Rc<RefCell<ChangeLog>>);

impl SharedChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.borrow().count()
    }

    pub fn count_for(&self, owner: OwnerId) -> usize {
        self.0.borrow().count_for(owner)
    }

    pub fn snapshot(&self) -> ChangeLog {
        self.0.borrow().clone()
    }
}

impl ChangeObserver for SharedChangeLog {
    fn blackboard_changed(&mut self, owner: OwnerId) {
        self.0.borrow_mut().blackboard_changed(owner);
    }
}
