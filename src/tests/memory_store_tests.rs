#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::models::{Product, Todo};
    use crate::store::{Filter, MemoryStore, StoreError, Storer};

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryStore::<Todo>::new();
        let mut first = Todo::new("one");
        let mut second = Todo::new("two");

        store.create(&mut first).await.unwrap();
        store.create(&mut second).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_generates_document_ids() {
        let store = MemoryStore::<Product>::new();
        let mut product = Product::new("Widget A", 1000, "A widget");

        store.create(&mut product).await.unwrap();

        let id = product.id.clone().expect("id assigned");
        assert!(!id.as_str().is_empty());
        let found = store.first(&Filter::by_id(id)).await.unwrap();
        assert_eq!(found.name, "Widget A");
    }

    #[tokio::test]
    async fn test_find_orders_by_id() {
        let store = MemoryStore::with_records(vec![
            Product { id: Some("zeta".parse().unwrap()), ..Product::new("Z", 1, "z") },
            Product { id: Some("alpha".parse().unwrap()), ..Product::new("A", 1, "a") },
            Product { id: Some("mid".parse().unwrap()), ..Product::new("M", 1, "m") },
        ]);

        let names: Vec<String> = store.find(&Filter::new()).await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "M", "Z"]);
        assert_eq!(store.first(&Filter::new()).await.unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_find_without_match_is_empty() {
        let store = MemoryStore::with_records(vec![Todo { id: Some(1), ..Todo::new("a") }]);
        let found = store.find(&Filter::new().eq("completed", true)).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_first_without_match_is_not_found() {
        let store = MemoryStore::<Todo>::new();
        let err = store.first(&Filter::by_id(42i64)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_find_respects_limit() {
        let store = MemoryStore::<Todo>::new();
        for i in 0..5 {
            store.create(&mut Todo::new(format!("todo {}", i))).await.unwrap();
        }
        let found = store.find(&Filter::new().limit(3)).await.unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(store.count(&Filter::new().limit(3)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_save_without_id_writes_nothing() {
        let store = MemoryStore::<Todo>::new();
        store.create(&mut Todo::new("existing")).await.unwrap();
        let writes = store.writes();

        let mut orphan = Todo::new("never created");
        store.save(&mut orphan).await.unwrap();

        assert_eq!(store.writes(), writes);
        assert_eq!(store.len().await, 1);
        assert!(orphan.id.is_none());
    }

    #[tokio::test]
    async fn test_save_updates_only_target_record() {
        let store = MemoryStore::<Todo>::new();
        let mut a = Todo::new("a");
        let mut b = Todo::new("b");
        store.create(&mut a).await.unwrap();
        store.create(&mut b).await.unwrap();

        a.completed = true;
        store.save(&mut a).await.unwrap();

        let stored_a = store.first(&Filter::by_id(a.id.unwrap())).await.unwrap();
        let stored_b = store.first(&Filter::by_id(b.id.unwrap())).await.unwrap();
        assert!(stored_a.completed);
        assert!(!stored_b.completed);
    }

    #[tokio::test]
    async fn test_save_does_not_create_missing_record() {
        let store = MemoryStore::<Todo>::new();
        let mut ghost = Todo { id: Some(99), ..Todo::new("ghost") };
        store.save(&mut ghost).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failing_store_reports_fault() {
        let store = MemoryStore::<Todo>::failing(|| StoreError::Timeout(Duration::from_secs(10)));

        assert!(matches!(store.find(&Filter::new()).await, Err(StoreError::Timeout(_))));
        assert!(matches!(store.create(&mut Todo::new("x")).await, Err(StoreError::Timeout(_))));
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_filter_field_is_rejected() {
        let store = MemoryStore::<Product>::new();
        let err = store.find(&Filter::new().eq("colour", "red")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }
}
