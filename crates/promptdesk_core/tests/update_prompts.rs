mod common;

use common::*;
use pretty_assertions::assert_eq;
use promptdesk_core::{
    update, AppState, DocumentInfo, Effect, JobId, Msg, Notification, Prompt, PromptDraft,
    StatusIndicator,
};

fn prompt(id: i64, name: &str) -> Prompt {
    Prompt {
        id,
        name: name.to_string(),
        prompt: format!("Teach {name} about fractions"),
        document: None,
    }
}

#[test]
fn crud_requires_a_session() {
    init_logging();
    let (_state, effects) = update(AppState::new(), Msg::PromptDeleteRequested { id: 1 });
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::PromptActionFailed {
            message: "sign in required".to_string()
        })]
    );
}

#[test]
fn create_trims_and_validates_draft() {
    init_logging();
    let state = signed_in(AppState::new());

    let (state, effects) = update(
        state,
        Msg::PromptCreateRequested(PromptDraft {
            name: "  ".to_string(),
            prompt: "text".to_string(),
        }),
    );
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(Notification::PromptActionFailed { .. })]
    ));

    let (_state, effects) = update(
        state,
        Msg::PromptCreateRequested(PromptDraft {
            name: " Dana ".to_string(),
            prompt: " Explain photosynthesis ".to_string(),
        }),
    );
    assert_eq!(
        effects,
        vec![Effect::CreatePrompt(PromptDraft {
            name: "Dana".to_string(),
            prompt: "Explain photosynthesis".to_string(),
        })]
    );
}

#[test]
fn refresh_replaces_cache_and_rows_show_job_indicator() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = update(
        state,
        Msg::EntitiesRefreshed(vec![prompt(1, "Dana"), prompt(2, "Arman")]),
    );
    let (mut state, _) = uploaded(state, "j1", 2);

    let view = state.view();
    assert_eq!(view.prompts.len(), 2);
    assert_eq!(view.prompts[0].indicator, None);
    assert_eq!(view.prompts[1].indicator, Some(StatusIndicator::Spinner));
    assert_eq!(view.prompts[1].document.as_deref(), Some("j1.pdf"));
    assert_eq!(
        state.prompt(2).unwrap().document,
        Some(DocumentInfo {
            job_id: JobId::from("j1"),
            filename: "j1.pdf".to_string(),
            book_reference: "book j1".to_string(),
        })
    );
    assert!(view.polling);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn deleting_prompt_drops_its_jobs() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = update(state, Msg::EntitiesRefreshed(vec![prompt(1, "Dana")]));
    let (state, _) = uploaded(state, "j1", 1);

    let (state, effects) = update(state, Msg::PromptDeleted { id: 1 });

    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::PromptDeleted { id: 1 })]
    );
    assert!(state.prompt(1).is_none());
    assert!(state.registry().is_empty());

    // Next tick sees nothing pending.
    let (state, effects) = tick(state, 1, 3);
    assert_eq!(effects, vec![Effect::CancelTimer { timer: 1 }]);
    assert!(!state.view().polling);
}

#[test]
fn deleting_document_detaches_it_from_prompt() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = update(state, Msg::EntitiesRefreshed(vec![prompt(1, "Dana")]));
    let (state, _) = uploaded(state, "j1", 1);

    let (state, effects) = update(
        state,
        Msg::DeleteDocumentRequested {
            job_id: JobId::from("j1"),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::DeleteDocument {
            job_id: JobId::from("j1")
        }]
    );

    let (state, _) = update(
        state,
        Msg::DocumentDeleted {
            job_id: JobId::from("j1"),
        },
    );
    assert_eq!(state.prompt(1).unwrap().document, None);
    assert!(state.registry().get(&JobId::from("j1")).is_none());
}

#[test]
fn saved_prompt_is_upserted() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = update(state, Msg::EntitiesRefreshed(vec![prompt(1, "Dana")]));
    let mut edited = prompt(1, "Dana");
    edited.prompt = "Quiz on verbs".to_string();

    let (state, effects) = update(state, Msg::PromptSaved(edited.clone()));

    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::PromptSaved { id: 1 })]
    );
    assert_eq!(state.prompt(1), Some(&edited));
}
