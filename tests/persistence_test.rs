use socialgraph::{
    FollowGraph, PersistenceManager, QueryLimits, ServerConfig, SocialGraphEngine, UserId, Wal, WalEntry,
};
use tempfile::TempDir;

fn uid(s: &str) -> UserId {
    UserId::new(s)
}

fn config_for(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        data_path: Some(dir.path().to_string_lossy().into_owned()),
        sync_wal: true,
        limits: QueryLimits::default(),
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn test_engine_restart_reproduces_graph() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir);

    let before = {
        let engine = SocialGraphEngine::open(&config).unwrap();
        for (a, b) in [("A", "B"), ("B", "C"), ("C", "D"), ("D", "A"), ("A", "C")] {
            engine.follow(&uid(a), &uid(b)).await.unwrap();
        }
        engine.unfollow(&uid("A"), &uid("C")).await.unwrap();
        engine.register_user(&uid("E")).await.unwrap();
        engine.remove_user(&uid("D")).await.unwrap();
        engine.flush().await.unwrap();

        let graph = engine.read().await;
        (
            graph.statistics(),
            graph.out_neighbors(&uid("A")),
            graph.followed_at(&uid("A"), &uid("B")),
        )
    };

    let engine = SocialGraphEngine::open(&config).unwrap();
    let graph = engine.read().await;
    assert_eq!(graph.statistics(), before.0);
    assert_eq!(graph.out_neighbors(&uid("A")), before.1);
    assert_eq!(graph.followed_at(&uid("A"), &uid("B")), before.2);
    assert!(graph.contains_user(&uid("E")));
    assert!(!graph.contains_user(&uid("D")));
    assert_eq!(
        graph.shortest_path(&uid("A"), &uid("C"), 6),
        Some(vec![uid("A"), uid("B"), uid("C")])
    );
}

#[tokio::test]
async fn test_checkpoint_then_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir);

    {
        let engine = SocialGraphEngine::open(&config).unwrap();
        for i in 0..20 {
            engine.follow(&uid(&format!("fan{}", i)), &uid("star")).await.unwrap();
        }
        for i in 0..10 {
            engine.unfollow(&uid(&format!("fan{}", i)), &uid("star")).await.unwrap();
        }
        assert!(engine.checkpoint().await.unwrap().is_some());
        engine.follow(&uid("star"), &uid("fan0")).await.unwrap();
        engine.flush().await.unwrap();
    }

    let engine = SocialGraphEngine::open(&config).unwrap();
    let stats = engine.statistics().await;
    assert_eq!(stats.user_count, 21);
    assert_eq!(stats.edge_count, 11);
    assert_eq!(engine.followers(&uid("star")).await.unwrap().len(), 10);

    let wal_files = std::fs::read_dir(temp_dir.path().join("wal")).unwrap().count();
    assert_eq!(wal_files, 2);
}

#[tokio::test]
async fn test_checkpoint_restart_keeps_path_choice() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir);
    let ids = ["P", "Q", "T", "X"];

    let before = {
        let engine = SocialGraphEngine::open(&config).unwrap();
        for (a, b) in [("Q", "T"), ("P", "X"), ("Q", "X"), ("P", "T")] {
            engine.follow(&uid(a), &uid(b)).await.unwrap();
        }
        engine.checkpoint().await.unwrap();
        engine.flush().await.unwrap();

        let graph = engine.read().await;
        let neighbors: Vec<_> = ids
            .iter()
            .map(|id| (graph.in_neighbors(&uid(id)), graph.out_neighbors(&uid(id))))
            .collect();
        (neighbors, graph.shortest_path(&uid("X"), &uid("T"), 6))
    };
    assert_eq!(before.1, Some(vec![uid("X"), uid("P"), uid("T")]));

    let engine = SocialGraphEngine::open(&config).unwrap();
    let graph = engine.read().await;
    for (id, (followers, following)) in ids.iter().zip(&before.0) {
        assert_eq!(&graph.in_neighbors(&uid(id)), followers);
        assert_eq!(&graph.out_neighbors(&uid(id)), following);
    }
    assert_eq!(graph.shortest_path(&uid("X"), &uid("T"), 6), before.1);
}

#[test]
fn test_replay_order_matters() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut wal = Wal::new(temp_dir.path().join("wal")).unwrap();
        wal.append(WalEntry::Follow { follower: "a".into(), followee: "b".into(), at: 1 }).unwrap();
        wal.append(WalEntry::Unfollow { follower: "a".into(), followee: "b".into() }).unwrap();
        wal.append(WalEntry::Follow { follower: "a".into(), followee: "b".into(), at: 5 }).unwrap();
        wal.flush().unwrap();
    }

    let manager = PersistenceManager::new(temp_dir.path()).unwrap();
    let mut graph = FollowGraph::new();
    assert_eq!(manager.recover(&mut graph).unwrap(), 3);
    assert_eq!(graph.followed_at(&uid("a"), &uid("b")), Some(5));
}

#[test]
fn test_in_memory_config_skips_disk() {
    let config = ServerConfig { data_path: None, ..ServerConfig::default() };
    let engine = SocialGraphEngine::open(&config).unwrap();
    assert_eq!(engine.limits(), &QueryLimits::default());
}
