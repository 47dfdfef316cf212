//! Backend-independent bookkeeping shared by every `PersistenceClient`
//! implementation: which tags follow from a change and how threads track
//! their drafts.

use crate::models::{Draft, Message, TagRef, Thread};

pub(crate) use crate::models::{
    OBJECT_CONTACT, OBJECT_DRAFT, OBJECT_FILE, OBJECT_MESSAGE, OBJECT_NAMESPACE, OBJECT_TAG,
    OBJECT_THREAD, OBJECT_WEBHOOK,
};

pub(crate) const DEFAULT_CONTENT_DISPOSITION: &str = "attachment";

/// Tags implied by a freshly synced message
pub(crate) fn tag_new_message(thread: &mut Thread, message: &Message) {
    thread.apply_tag(&TagRef::canonical("inbox"));
    if !message.is_read {
        thread.apply_tag(&TagRef::canonical("unread"));
        thread.apply_tag(&TagRef::canonical("unseen"));
    }
    if !message.files.is_empty() {
        thread.apply_tag(&TagRef::canonical("attachment"));
    }
}

/// Keep `unread`/`unseen` in step with one message's read flag.
/// `all_read` covers every message of the thread after the change.
pub(crate) fn apply_read_state(thread: &mut Thread, unread: bool, all_read: bool) {
    if unread {
        thread.apply_tag(&TagRef::canonical("unread"));
    } else {
        thread.remove_tag("unseen");
        if all_read {
            thread.remove_tag("unread");
        }
    }
}

pub(crate) fn attach_draft(thread: &mut Thread, draft: &Draft, tags: &[TagRef]) {
    thread.drafts.push(draft.id.clone());
    thread.add_participants(draft.recipients());
    thread.apply_tag(&TagRef::canonical("drafts"));
    for tag in tags {
        thread.apply_tag(tag);
    }
}

pub(crate) fn replace_draft(thread: &mut Thread, parent: &Draft, child: &Draft, tags: &[TagRef]) {
    match thread.drafts.iter_mut().find(|id| **id == parent.id) {
        Some(slot) => *slot = child.id.clone(),
        None => thread.drafts.push(child.id.clone()),
    }
    thread.add_participants(child.recipients());
    for tag in tags {
        thread.apply_tag(tag);
    }
}

/// Drop revisions from the thread; returns true when the thread is now
/// empty and should be deleted
pub(crate) fn detach_drafts(thread: &mut Thread, revision_ids: &[String]) -> bool {
    thread.drafts.retain(|id| !revision_ids.contains(id));
    if thread.drafts.is_empty() {
        thread.remove_tag("drafts");
    }
    thread.messages.is_empty() && thread.drafts.is_empty()
}
