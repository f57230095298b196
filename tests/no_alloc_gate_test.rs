use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tetris_battle::core::{BoardEngine, EngineRules};
use tetris_battle::net::{MatchClient, MatchOptions, ServerMessage};
use tetris_battle::types::PlayerCommand;

struct CountingAlloc;

static COUNT_ENABLED: AtomicBool = AtomicBool::new(false);
static ALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.realloc(ptr, layout, new_size)
    }
}

fn with_alloc_counting<F: FnOnce()>(f: F) -> usize {
    ALLOC_COUNT.store(0, Ordering::Relaxed);
    COUNT_ENABLED.store(true, Ordering::Relaxed);
    f();
    COUNT_ENABLED.store(false, Ordering::Relaxed);
    ALLOC_COUNT.load(Ordering::Relaxed)
}

// Both gates share one global counter, so they run inside a single test.
#[test]
fn engine_and_client_hot_paths_do_not_allocate() {
    // Setup (outside counting) so one-time allocations don't trip the gate.
    let mut engine = BoardEngine::new(1, EngineRules::default());
    engine.start();

    let mut client = MatchClient::new(2);
    client.handle_server_message(&ServerMessage::Welcome { player_id: 1 });
    let started = ServerMessage::GameStarted {
        options: MatchOptions::default(),
    };
    let penalty = ServerMessage::AddPenaltyLines {
        lines: 1,
        from: "opponent".to_string(),
    };
    client.handle_server_message(&started);

    let engine_allocs = with_alloc_counting(|| {
        for _ in 0..200 {
            let _ = engine.tick();
        }

        for _ in 0..50 {
            let _ = engine.apply_command(PlayerCommand::MoveLeft);
            let _ = engine.apply_command(PlayerCommand::MoveRight);
            let _ = engine.apply_command(PlayerCommand::Rotate);
            let _ = engine.apply_command(PlayerCommand::SoftDrop);
        }

        // Hard drop drives lock, line clear and spawn.
        for _ in 0..25 {
            let _ = engine.apply_command(PlayerCommand::HardDrop);
            engine.add_penalty_lines(1);
            engine.increase_level();
            let _ = engine.snapshot();
            if engine.game_over() {
                engine.reset(EngineRules::default());
                engine.start();
            }
        }
    });
    assert_eq!(engine_allocs, 0);

    let client_allocs = with_alloc_counting(|| {
        for _ in 0..25 {
            let _ = client.on_gravity();
            let _ = client.on_command(PlayerCommand::Rotate);
            let _ = client.on_command(PlayerCommand::HardDrop);
            let _ = client.handle_server_message(&penalty);
            let _ = client.on_level_up();
            if !client.is_running() {
                let _ = client.handle_server_message(&started);
            }
        }
    });
    assert_eq!(client_allocs, 0);
}
