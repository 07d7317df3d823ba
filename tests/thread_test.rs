mod common;

use std::time::Duration;

use common::{FlakyStore, upload};
use teamboard::error::AppError;
use teamboard::forms::{AnswerForm, DiscussionForm};
use teamboard::models::{Answer, CommentKind, NewAnswer, NewDiscussion, NewTask, Task, TaskKind};
use teamboard::services::{CommentInput, CommentThread, DiscussionBoard, ListController, ThreadController};

async fn seed_task(store: &std::sync::Arc<FlakyStore>) -> String {
    let mut tasks = ListController::<Task>::new(store.clone());
    tasks
        .create(NewTask {
            text: "Prepare the release".to_string(),
            kind: TaskKind::Text,
            content: None,
        })
        .await
        .expect("task");
    tasks.items()[0].id.clone()
}

#[tokio::test]
async fn test_text_and_link_comments_oldest_first() {
    let store = FlakyStore::new().await;
    let task_id = seed_task(&store).await;
    let mut comments = CommentThread::mount(store.clone(), &task_id).await;

    comments.submit(CommentInput::Text("  looks good  ".to_string())).await.expect("text");
    comments
        .submit(CommentInput::Link("https://github.com/rust-lang/rust".to_string()))
        .await
        .expect("link");

    let kinds: Vec<CommentKind> = comments.comments().iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CommentKind::Text, CommentKind::Link]);
    assert_eq!(comments.comments()[0].content, "looks good");
    assert!(comments.comments().iter().all(|c| c.task_id == task_id));
}

#[tokio::test]
async fn test_comments_are_scoped_to_their_task() {
    let store = FlakyStore::new().await;
    let first = seed_task(&store).await;
    let second = seed_task(&store).await;

    let mut a = CommentThread::new(store.clone(), &first);
    a.submit(CommentInput::Text("on first".to_string())).await.expect("comment");

    let b = CommentThread::mount(store.clone(), &second).await;
    assert!(b.comments().is_empty());
    assert_eq!(b.task_id(), second);
}

#[tokio::test]
async fn test_file_comment_references_uploaded_blob() {
    let store = FlakyStore::new().await;
    let task_id = seed_task(&store).await;
    let mut comments = CommentThread::new(store.clone(), &task_id);

    comments
        .submit(CommentInput::File(upload("design.pdf", b"%PDF-1.7")))
        .await
        .expect("file comment");

    let comment = &comments.comments()[0];
    assert_eq!(comment.kind, CommentKind::File);
    assert_eq!(comment.content, "design.pdf");

    let url = comment.file_url.as_deref().expect("file url");
    let prefix = "http://localhost/storage/v1/object/public/task-files/";
    assert!(url.starts_with(prefix));
    assert!(url.ends_with(".pdf"));

    let path = &url[prefix.len()..];
    let stored = store.inner().read_blob("task-files", path).await.expect("read");
    assert_eq!(stored, Some(b"%PDF-1.7".to_vec()));
}

#[tokio::test]
async fn test_folder_comment_kind() {
    let store = FlakyStore::new().await;
    let task_id = seed_task(&store).await;
    let mut comments = CommentThread::new(store.clone(), &task_id);

    comments
        .submit(CommentInput::Folder(upload("assets.zip", &[0x50, 0x4b])))
        .await
        .expect("folder comment");

    assert_eq!(comments.comments()[0].kind, CommentKind::Folder);
    assert!(comments.comments()[0].file_url.is_some());
}

#[tokio::test]
async fn test_failed_upload_never_inserts() {
    let store = FlakyStore::new().await;
    let task_id = seed_task(&store).await;
    let mut comments = CommentThread::mount(store.clone(), &task_id).await;

    FlakyStore::set(&store.fail_upload, true);
    store.reset_counts();

    let result = comments.submit(CommentInput::File(upload("notes.txt", b"hi"))).await;

    assert!(matches!(result, Err(AppError::Upload(_))));
    assert_eq!(FlakyStore::count(&store.uploads), 1);
    assert_eq!(FlakyStore::count(&store.inserts), 0);
    assert!(comments.comments().is_empty());
    assert!(comments.error().is_some());
}

#[tokio::test]
async fn test_insert_failure_after_upload_is_a_write_error() {
    let store = FlakyStore::new().await;
    let task_id = seed_task(&store).await;
    let mut comments = CommentThread::new(store.clone(), &task_id);

    FlakyStore::set(&store.fail_insert, true);
    store.reset_counts();

    let result = comments.submit(CommentInput::File(upload("notes.txt", b"hi"))).await;

    assert!(matches!(result, Err(AppError::Write(_))));
    assert_eq!(FlakyStore::count(&store.uploads), 1);
    assert_eq!(FlakyStore::count(&store.inserts), 1);
}

#[tokio::test]
async fn test_empty_text_comment_is_rejected_locally() {
    let store = FlakyStore::new().await;
    let task_id = seed_task(&store).await;
    let mut comments = CommentThread::new(store.clone(), &task_id);
    store.reset_counts();

    let result = comments.submit(CommentInput::Text("   ".to_string())).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(FlakyStore::count(&store.inserts), 0);
}

#[tokio::test]
async fn test_thread_controller_for_answers() {
    let store = FlakyStore::new().await;
    let mut board = DiscussionBoard::new(store.clone());
    board
        .create(NewDiscussion {
            question: "Which runtime?".to_string(),
        })
        .await
        .expect("discussion");
    let discussion_id = board.threads()[0].discussion.id.clone();

    let mut answers = ThreadController::<Answer>::mount(store.clone(), &discussion_id).await;
    assert!(answers.items().is_empty());
    assert_eq!(answers.error(), None);
    answers
        .create(NewAnswer {
            content: "tokio".to_string(),
        })
        .await
        .expect("answer");

    assert_eq!(answers.parent_id(), discussion_id);
    assert_eq!(answers.items().len(), 1);
    assert_eq!(answers.items()[0].discussion_id, discussion_id);
}

#[tokio::test]
async fn test_board_pairs_every_discussion_with_its_answers() {
    let store = FlakyStore::with_select_delay(Duration::from_millis(20)).await;
    let mut board = DiscussionBoard::with_fanout(store.clone(), 2);

    for question in ["q0", "q1", "q2", "q3", "q4"] {
        let mut form = DiscussionForm {
            question: question.to_string(),
        };
        board.submit(&mut form).await.expect("discussion");
    }

    let ids: Vec<(String, String)> = board
        .threads()
        .iter()
        .map(|t| (t.discussion.question.clone(), t.discussion.id.clone()))
        .collect();

    // Uneven answer counts: q0 gets none, q1 one, q2 two, and so on.
    for (question, id) in &ids {
        let count: usize = question[1..].parse().expect("index");
        for n in 0..count {
            let mut form = AnswerForm {
                content: format!("{}-a{}", question, n),
            };
            board.submit_answer(id, &mut form).await.expect("answer");
        }
    }

    store.reset_counts();
    board.load().await.expect("load");

    let questions: Vec<&str> = board.threads().iter().map(|t| t.discussion.question.as_str()).collect();
    assert_eq!(questions, vec!["q4", "q3", "q2", "q1", "q0"]);

    for thread in board.threads() {
        let expected: usize = thread.discussion.question[1..].parse().expect("index");
        assert_eq!(thread.answers.len(), expected);
        assert!(thread.answers.iter().all(|a| a.discussion_id == thread.discussion.id));
        let contents: Vec<String> = thread.answers.iter().map(|a| a.content.clone()).collect();
        let ordered: Vec<String> = (0..expected)
            .map(|n| format!("{}-a{}", thread.discussion.question, n))
            .collect();
        assert_eq!(contents, ordered);
    }

    assert_eq!(FlakyStore::count(&store.selects), 1 + ids.len());
    assert!(FlakyStore::count(&store.max_in_flight) <= 2);
    assert_eq!(board.error(), None);
}

#[tokio::test]
async fn test_failed_answer_fetch_yields_empty_answers() {
    let store = FlakyStore::new().await;
    let mut board = DiscussionBoard::new(store.clone());
    board.create(NewDiscussion { question: "one".to_string() }).await.expect("d1");
    board.create(NewDiscussion { question: "two".to_string() }).await.expect("d2");

    for thread in board.threads().to_vec() {
        board
            .answer(&thread.discussion.id, NewAnswer { content: "yes".to_string() })
            .await
            .expect("answer");
    }

    let broken = board.threads()[0].discussion.id.clone();
    *store.fail_children_of.lock().expect("lock") = Some(broken.clone());

    board.load().await.expect("discussions still load");

    assert_eq!(board.threads().len(), 2);
    let by_id = |id: &str| board.threads().iter().find(|t| t.discussion.id == id).expect("thread");
    assert!(by_id(&broken).answers.is_empty());
    assert_eq!(board.threads()[1].answers.len(), 1);
    assert!(board.error().is_some());
}

#[tokio::test]
async fn test_failed_discussion_fetch_leaves_board_unchanged() {
    let store = FlakyStore::new().await;
    let mut board = DiscussionBoard::new(store.clone());
    board.create(NewDiscussion { question: "kept".to_string() }).await.expect("create");
    let before = board.threads().to_vec();

    FlakyStore::set(&store.fail_select, true);
    let result = board.load().await;

    assert!(matches!(result, Err(AppError::Read(_))));
    assert_eq!(board.threads(), before.as_slice());
    assert!(board.error().is_some());
}

#[tokio::test]
async fn test_failed_answer_keeps_form() {
    let store = FlakyStore::new().await;
    let mut board = DiscussionBoard::new(store.clone());
    board.create(NewDiscussion { question: "why?".to_string() }).await.expect("create");
    let id = board.threads()[0].discussion.id.clone();

    FlakyStore::set(&store.fail_insert, true);
    let mut form = AnswerForm {
        content: "because".to_string(),
    };

    let result = board.submit_answer(&id, &mut form).await;

    assert!(matches!(result, Err(AppError::Write(_))));
    assert_eq!(form.content, "because");
    assert!(board.threads()[0].answers.is_empty());
}

#[tokio::test]
async fn test_mount_loads_existing_comments() {
    let store = FlakyStore::new().await;
    let task_id = seed_task(&store).await;
    let mut first = CommentThread::new(store.clone(), &task_id);
    first.submit(CommentInput::Text("already here".to_string())).await.expect("comment");

    let thread = ThreadController::<teamboard::models::TaskComment>::mount(store.clone(), &task_id).await;
    assert_eq!(thread.items().len(), 1);

    FlakyStore::set(&store.fail_select, true);
    let failed = CommentThread::mount(store.clone(), &task_id).await;
    assert!(failed.comments().is_empty());
    assert!(failed.error().is_some());
}

#[tokio::test]
async fn test_unreadable_answer_rows_are_reported() {
    use teamboard::store::RemoteStore;

    let store = FlakyStore::new().await;
    let mut board = DiscussionBoard::new(store.clone());
    board.create(NewDiscussion { question: "seen?".to_string() }).await.expect("create");
    let id = board.threads()[0].discussion.id.clone();

    store
        .insert("answers", serde_json::json!({ "discussion_id": id }))
        .await
        .expect("raw insert");
    board.load().await.expect("load");

    assert!(board.threads()[0].answers.is_empty());
    assert!(board.error().expect("reported").contains("answers"));
}
