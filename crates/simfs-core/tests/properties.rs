use proptest::prelude::*;
use simfs_core::{FileSystem, FsConfig};

#[derive(Debug, Clone)]
enum Op {
    CreateFile(usize, usize),
    CreateDir(usize),
    RemoveFile(usize),
    RemoveDir(usize),
    ChangeDir(usize),
}

const NAMES: [&str; 6] = ["a", "b", "c", "a/x", "b/y", "a/x/z"];

fn op() -> impl Strategy<Value = Op> {
    let name = 0..NAMES.len();
    prop_oneof![
        (name.clone(), 0..700usize).prop_map(|(n, len)| Op::CreateFile(n, len)),
        name.clone().prop_map(Op::CreateDir),
        name.clone().prop_map(Op::RemoveFile),
        name.clone().prop_map(Op::RemoveDir),
        name.prop_map(Op::ChangeDir),
    ]
}

fn small_config() -> FsConfig {
    FsConfig {
        block_size: 64,
        total_blocks: 24,
        total_inodes: 8,
        max_blocks_per_file: 8,
        max_entries_per_dir: 5,
        max_name_len: 8,
    }
}

proptest! {
    #[test]
    fn invariants_hold_after_every_operation(ops in prop::collection::vec(op(), 1..40)) {
        let mut fs = FileSystem::new(small_config()).unwrap();
        for op in ops {
            let before = fs.pool_status();
            let listing = fs.list("/").unwrap();
            let result = match &op {
                Op::CreateFile(n, len) => fs.create_file(NAMES[*n], &vec![b'q'; *len]).map(|_| ()),
                Op::CreateDir(n) => fs.create_directory(NAMES[*n]).map(|_| ()),
                Op::RemoveFile(n) => fs.remove_file(NAMES[*n]),
                Op::RemoveDir(n) => fs.remove_directory(NAMES[*n]),
                Op::ChangeDir(n) => fs.change_directory(NAMES[*n]),
            };
            if result.is_err() {
                prop_assert_eq!(fs.pool_status(), before);
                prop_assert_eq!(fs.list("/").unwrap(), listing);
            }
            let report = fs.check();
            prop_assert!(report.is_clean(), "{:?} after {:?}", report, op);
            // Back to a fixed base so the relative names keep meaning.
            fs.change_directory("/").unwrap();
        }
    }

    #[test]
    fn content_round_trips(content in prop::collection::vec(any::<u8>(), 0..=2048)) {
        let mut fs = FileSystem::new(FsConfig::default()).unwrap();
        fs.create_file("/f", &content).unwrap();
        prop_assert_eq!(fs.read("/f").unwrap(), content);
    }
}
