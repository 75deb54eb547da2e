use std::sync::Arc;

use crate::models::{Action, Identity, Item, NewAction, NewItem, NewProject, Project};
use crate::services::ProjectService;
use crate::store::MemoryStore;

/// Unit-test fixtures: a service over a fresh in-process store plus the
/// cast of identities the permission rules care about.
pub struct TestContext {
    pub service: Arc<ProjectService>,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            service: Arc::new(ProjectService::new(Arc::new(MemoryStore::new()))),
        }
    }

    pub fn admin() -> Identity {
        Identity { user_id: 1, is_admin: true }
    }

    /// Creator of every fixture project.
    pub fn owner() -> Identity {
        Identity { user_id: 10, is_admin: false }
    }

    /// Plain user, granted rights explicitly where a test needs them.
    pub fn member() -> Identity {
        Identity { user_id: 20, is_admin: false }
    }

    pub fn stranger() -> Identity {
        Identity { user_id: 99, is_admin: false }
    }

    /// Private project created by [`TestContext::owner`].
    pub async fn project(&self) -> Project {
        self.service
            .create_project(Self::owner(), NewProject {
                title: "Projeto de teste".into(),
                ..Default::default()
            })
            .await
            .expect("fixture project")
    }

    /// Project with `items` x `actions` axes and no cells.
    pub async fn matrix(&self, items: usize, actions: usize) -> (Project, Vec<Item>, Vec<Action>) {
        let project = self.project().await;
        let mut created_items = Vec::with_capacity(items);
        for i in 0..items {
            let item = self
                .service
                .add_item(Self::owner(), project.id, NewItem {
                    name: format!("Item {}", i + 1),
                    ..Default::default()
                })
                .await
                .expect("fixture item");
            created_items.push(item);
        }
        let mut created_actions = Vec::with_capacity(actions);
        for a in 0..actions {
            let action = self
                .service
                .add_action(Self::owner(), project.id, NewAction {
                    name: format!("Acao {}", a + 1),
                    ..Default::default()
                })
                .await
                .expect("fixture action");
            created_actions.push(action);
        }
        (project, created_items, created_actions)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
