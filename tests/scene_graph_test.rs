use cgmath::{One, Quaternion, Vector3};
use neonroom::scene::{Scene, SceneNode, Transform};

fn tree() -> SceneNode {
    let mut root = SceneNode::container("root");
    let mut inner = SceneNode::container("inner");
    inner.children.push(SceneNode::container("leaf"));
    root.children.push(inner);
    root.children.push(SceneNode::container("sibling"));
    root
}

#[test]
fn should_find_nodes_at_any_depth() {
    let mut scene = Scene::new();
    scene.add(tree());

    assert!(scene.find_mut("root").is_some());
    assert!(scene.find_mut("leaf").is_some());
    assert!(scene.find_mut("sibling").is_some());
    assert!(scene.find_mut("missing").is_none());
    assert_eq!(scene.node_count(), 4);
}

#[test]
fn should_visit_every_node_once() {
    let mut scene = Scene::new();
    scene.add(tree());

    let mut visited = Vec::new();
    scene.traverse_mut(&mut |node| visited.push(node.name.clone()));
    assert_eq!(visited.len(), 4);
    assert!(visited.contains(&"leaf".to_string()));
}

#[test]
fn should_clear_on_dispose() {
    let mut scene = Scene::new();
    scene.add(tree());
    assert!(!scene.is_empty());

    scene.clear();
    assert!(scene.is_empty());
    assert_eq!(scene.node_count(), 0);
}

#[test]
fn should_compose_parent_and_child_transforms() {
    let parent = Transform {
        position: Vector3::new(0.0, -0.05, 0.0),
        rotation: Quaternion::one(),
        scale: Vector3::new(0.05, 0.05, 0.05),
    };
    let child = Transform {
        position: Vector3::new(1.0, 2.0, 3.0),
        rotation: Quaternion::one(),
        scale: Vector3::new(2.0, 2.0, 2.0),
    };

    let world = &parent * &child;
    assert_eq!(world.position, Vector3::new(0.05, 0.05, 0.15));
    assert_eq!(world.scale, Vector3::new(0.1, 0.1, 0.1));
}
