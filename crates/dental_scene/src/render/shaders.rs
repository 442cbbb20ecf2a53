//! Built-in GLSL ES 3.0 sources
//!
//! Attribute locations match the slots in [`crate::gpu::array`].

/// Shared vertex stage for untextured techniques
pub const DEFAULT_VERTEX: &str = r"#version 300 es
layout (location = 0) in vec3 aPosition;
layout (location = 1) in vec3 aNormal;
layout (location = 2) in vec4 aColor;
uniform mat4 uMV;
uniform mat4 uMVP;
out vec3 normal;
out vec4 color;
void main() {
  normal = mat3(uMV) * aNormal;
  color = aColor;
  gl_Position = uMVP * vec4(aPosition, 1.0);
}";

/// Headlight shading of per-vertex colour, grey when the mesh has none
pub const DEFAULT_FRAGMENT: &str = r"#version 300 es
precision mediump float;
uniform bool uHasColor;
in vec3 normal;
in vec4 color;
out vec4 FragColor;
void main() {
  vec4 base = uHasColor ? color : vec4(0.85, 0.85, 0.8, 1.0);
  float light = abs(normalize(normal).z);
  FragColor = vec4(base.rgb * (0.3 + 0.7 * light), base.a);
}";

/// Position only vertex stage
pub const MONO_COLOR_VERTEX: &str = r"#version 300 es
layout (location = 0) in vec3 aPosition;
uniform mat4 uMVP;
void main() {
  gl_Position = uMVP * vec4(aPosition, 1.0);
}";

/// Flat `uColor`
pub const MONO_COLOR_FRAGMENT: &str = r"#version 300 es
precision mediump float;
uniform vec4 uColor;
out vec4 FragColor;
void main() {
  FragColor = vec4(uColor.rgb, 1.0);
}";

/// Position plus texcoord vertex stage
pub const TEXTURE_VERTEX: &str = r"#version 300 es
layout (location = 0) in vec3 aPosition;
layout (location = 3) in vec2 aTexcoord;
uniform mat4 uMVP;
out vec2 texcoord;
void main() {
  texcoord = aTexcoord;
  gl_Position = uMVP * vec4(aPosition, 1.0);
}";

/// Plain texture lookup
pub const TEXTURE_FRAGMENT: &str = r"#version 300 es
precision mediump float;
uniform sampler2D uTexture;
in vec2 texcoord;
out vec4 FragColor;
void main() {
  FragColor = texture(uTexture, texcoord);
}";

/// Glyph rendering, either signed distance field or blurred coverage
pub const TEXT_FRAGMENT: &str = r"#version 300 es
precision mediump float;
uniform vec4 uColor;
uniform sampler2D uTexture;
uniform bool uSdf;
in vec2 texcoord;
out vec4 FragColor;

const float glyphEdge = 0.5;
const float gamma = 2.2;

void main() {
  if (uSdf) {
    float dist = texture(uTexture, texcoord).a;
    if (dist < 0.49) {
      discard;
    }
    float width = fwidth(dist);
    float alpha = clamp(smoothstep(glyphEdge - width, glyphEdge + width, dist), 0.0, 1.0);
    alpha = pow(alpha, 1.0 / gamma);
    FragColor = vec4(uColor.rgb, uColor.a * alpha);
    FragColor.rgb *= FragColor.a;
  } else {
    ivec2 size = textureSize(uTexture, 0);
    vec2 offset = vec2(1.0 / float(size.x), 1.0 / float(size.y));
    vec4 color = texture(uTexture, texcoord) * 0.147761;
    color += texture(uTexture, texcoord + vec2(-offset.x, -offset.y)) * 0.09474;
    color += texture(uTexture, texcoord + vec2( offset.x, -offset.y)) * 0.09474;
    color += texture(uTexture, texcoord + vec2( offset.x,  offset.y)) * 0.09474;
    color += texture(uTexture, texcoord + vec2(-offset.x,  offset.y)) * 0.09474;
    color += texture(uTexture, texcoord + vec2(-offset.x,  0.0)) * 0.118318;
    color += texture(uTexture, texcoord + vec2( offset.x,  0.0)) * 0.118318;
    color += texture(uTexture, texcoord + vec2( 0.0,  offset.y)) * 0.118318;
    color += texture(uTexture, texcoord + vec2( 0.0, -offset.y)) * 0.118318;
    color.a = color.r;
    FragColor = color * uColor;
  }
}";
