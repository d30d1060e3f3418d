use anyhow::Result;
use bytes::Bytes;
use medallion_bucket::{BucketError, BucketStore, LocalBucketStore};

#[tokio::test]
async fn local_store_round_trips_nested_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = LocalBucketStore::new(dir.path()).await?;

    store
        .put_object("demo", "bronze/teams/roster.csv", Bytes::from_static(b"a,b\n1,2\n"), "text/csv")
        .await?;
    store
        .put_object("demo", "gold/latest/roster_latest.csv", Bytes::from_static(b"a\n"), "text/csv")
        .await?;

    assert_eq!(
        store.get_object("demo", "bronze/teams/roster.csv").await?,
        Bytes::from_static(b"a,b\n1,2\n")
    );
    assert!(dir.path().join("demo/bronze/teams/roster.csv").is_file());

    let all = store.list_objects("demo", "").await?;
    assert_eq!(
        all,
        vec![
            "bronze/teams/roster.csv".to_string(),
            "gold/latest/roster_latest.csv".to_string(),
        ]
    );
    assert_eq!(
        store.list_objects("demo", "gold/latest/").await?,
        vec!["gold/latest/roster_latest.csv".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn local_store_reports_missing_objects_and_buckets() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = LocalBucketStore::new(dir.path()).await?;

    assert!(store.list_objects("absent", "gold/").await?.is_empty());
    assert!(matches!(
        store.get_object("absent", "silver/x.csv").await,
        Err(BucketError::NotFound(key)) if key == "silver/x.csv"
    ));
    Ok(())
}

#[tokio::test]
async fn local_store_rejects_escaping_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = LocalBucketStore::new(dir.path()).await?;

    for key in ["../outside.csv", "/etc/passwd", "bronze/../../x.csv", ""] {
        let result = store
            .put_object("demo", key, Bytes::from_static(b"x"), "text/csv")
            .await;
        assert!(
            matches!(result, Err(BucketError::InvalidKey(_))),
            "key {key:?} should be rejected"
        );
    }
    Ok(())
}

#[tokio::test]
async fn local_store_overwrites_in_place() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = LocalBucketStore::new(dir.path()).await?;
    let key = "gold/latest/roster_latest.csv";

    store.put_object("demo", key, Bytes::from_static(b"first"), "text/csv").await?;
    store.put_object("demo", key, Bytes::from_static(b"second"), "text/csv").await?;

    assert_eq!(store.list_objects("demo", "gold/latest/").await?.len(), 1);
    assert_eq!(store.get_object("demo", key).await?, Bytes::from_static(b"second"));

    store.delete_object("demo", key).await?;
    assert!(store.list_objects("demo", "gold/latest/").await?.is_empty());
    Ok(())
}
